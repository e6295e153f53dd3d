//! JSON-RPC framing codec for the backend wire protocol.
//!
//! The backend speaks `Content-Length: N\r\n\r\n{json}` framing over
//! stdin/stdout. This module provides [`FrameReader`] and [`FrameWriter`]
//! for async reading and writing of framed messages.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::LspError;

/// Maximum frame size (4 MiB) to prevent unbounded memory allocation.
const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

/// Reads framed JSON-RPC messages from an async reader.
///
/// Parses `Content-Length` headers and reads exactly that many bytes,
/// then deserializes the body as JSON.
pub struct FrameReader<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read the next JSON-RPC frame.
    ///
    /// Returns `Ok(None)` on end-of-stream, including EOF mid-header or
    /// mid-body — a dying backend is a normal shutdown, not corruption.
    /// A frame with no `Content-Length` header or a declared length of 0
    /// carries no payload; it is discarded and the reader waits for the
    /// next frame. Returns `Err` on malformed headers, oversized frames,
    /// or a body that is not valid JSON.
    pub async fn read_frame(&mut self) -> Result<Option<serde_json::Value>, LspError> {
        loop {
            let content_length = match self.read_headers().await? {
                Some(len) => len,
                None => return Ok(None), // EOF
            };

            // Empty or absent payload: skip and resume waiting.
            let Some(len) = content_length else { continue };
            if len == 0 {
                continue;
            }

            if len > MAX_FRAME_BYTES {
                return Err(LspError::Protocol(format!(
                    "Content-Length {len} exceeds maximum {MAX_FRAME_BYTES}"
                )));
            }

            let mut body = vec![0u8; len];
            match self.reader.read_exact(&mut body).await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    // Stream closed mid-body: treat as shutdown.
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            }

            let value = serde_json::from_slice(&body)
                .map_err(|e| LspError::Protocol(format!("invalid JSON in frame body: {e}")))?;
            return Ok(Some(value));
        }
    }

    /// Parse headers until the empty separator line.
    ///
    /// Returns `Ok(None)` on EOF (even partway through a header block),
    /// `Ok(Some(None))` when the block carried no `Content-Length`.
    async fn read_headers(&mut self) -> Result<Option<Option<usize>>, LspError> {
        let mut content_length: Option<usize> = None;
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = self.reader.read_line(&mut line).await?;
            if bytes_read == 0 {
                return Ok(None);
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                // Empty line = end of headers
                break;
            }

            // The wire format says "Content-Length" but parse
            // case-insensitively for robustness.
            if let Some(colon_pos) = trimmed.find(':') {
                let key = &trimmed[..colon_pos];
                if key.eq_ignore_ascii_case("Content-Length") {
                    let len: usize = trimmed[colon_pos + 1..].trim().parse().map_err(|_| {
                        LspError::Protocol(format!(
                            "invalid Content-Length value: {}",
                            trimmed[colon_pos + 1..].trim()
                        ))
                    })?;
                    content_length = Some(len);
                }
            }
            // Ignore other headers (e.g. Content-Type)
        }

        Ok(Some(content_length))
    }
}

/// Writes framed JSON-RPC messages to an async writer.
///
/// Serializes JSON and prepends the `Content-Length` header. Each frame is
/// assembled into a single buffer and written with one `write_all`, so a
/// frame's header and body can never interleave with another frame.
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write one JSON-RPC frame with its `Content-Length` header.
    pub async fn write_frame(&mut self, msg: &serde_json::Value) -> Result<(), LspError> {
        let body = serde_json::to_string(msg)
            .map_err(|e| LspError::Protocol(format!("serializing frame: {e}")))?;

        let mut frame = Vec::with_capacity(body.len() + 32);
        frame.extend_from_slice(format!("Content-Length: {}\r\n\r\n", body.len()).as_bytes());
        frame.extend_from_slice(body.as_bytes());

        self.writer.write_all(&frame).await?;
        self.writer.flush().await?;

        Ok(())
    }
}

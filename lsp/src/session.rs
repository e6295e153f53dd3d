//! RPC session: request/response correlation over the framed channel.
//!
//! One session per workspace. A single background task owns the inbound
//! stream; outbound frames funnel through a writer task so header and body
//! bytes never interleave. Replies are correlated strictly by id — the
//! backend may answer out of order.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, OnceLock};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::codec::{FrameReader, FrameWriter};
use crate::error::LspError;
use crate::process::{BackendConfig, Supervisor};
use crate::protocol::{self, Incoming, Notification, Request, ServerNotice};

/// Ceiling for any single request, matching the backend's worst observed
/// cold-start analysis time.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const WRITER_CHANNEL_CAPACITY: usize = 64;

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<serde_json::Value, LspError>>>>>;

enum WriterCommand {
    Send(serde_json::Value),
    Shutdown,
}

/// Lifecycle of a session. Sessions are born `Initializing`; only the
/// handshake may run there, everything else requires `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Initializing,
    Ready,
    ShuttingDown,
    Closed,
}

impl SessionState {
    fn name(self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::ShuttingDown => "shutting down",
            Self::Closed => "closed",
        }
    }
}

/// An initialized RPC session against the backend process.
///
/// All methods take `&self`; callers share the session behind an [`Arc`]
/// and may issue requests concurrently. Ids are allocated atomically, so
/// two concurrent requests never observe the same id.
pub struct Session {
    state: StdMutex<SessionState>,
    next_id: AtomicU64,
    pending: PendingMap,
    capabilities: OnceLock<serde_json::Value>,
    writer_tx: mpsc::Sender<WriterCommand>,
    request_timeout: Duration,
    supervisor: Mutex<Supervisor>,
    reader_handle: Mutex<Option<JoinHandle<()>>>,
    writer_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    /// Spawn the backend for `workspace_root` and perform the handshake.
    pub async fn connect(config: &BackendConfig, workspace_root: &Path) -> Result<Self, LspError> {
        let (supervisor, stdin, stdout) = Supervisor::start(config)?;
        let session = Self::over_streams(stdout, stdin, supervisor, REQUEST_TIMEOUT);
        session.initialize(workspace_root).await?;
        Ok(session)
    }

    /// Build the session plumbing over arbitrary duplex streams.
    ///
    /// The returned session is in `Initializing`; the caller must run
    /// [`Session::initialize`] before issuing other requests.
    pub(crate) fn over_streams<R, W>(
        reader: R,
        writer: W,
        supervisor: Supervisor,
        request_timeout: Duration,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));

        let (writer_tx, mut writer_rx) = mpsc::channel::<WriterCommand>(WRITER_CHANNEL_CAPACITY);
        let writer_handle = tokio::spawn(async move {
            let mut writer = FrameWriter::new(writer);
            while let Some(cmd) = writer_rx.recv().await {
                match cmd {
                    WriterCommand::Send(frame) => {
                        if let Err(e) = writer.write_frame(&frame).await {
                            tracing::warn!("write error: {e}");
                            break;
                        }
                    }
                    WriterCommand::Shutdown => break,
                }
            }
        });

        let reader_pending = pending.clone();
        let reader_writer_tx = writer_tx.clone();
        let reader_handle = tokio::spawn(async move {
            let mut reader = FrameReader::new(reader);
            loop {
                match reader.read_frame().await {
                    Ok(Some(frame)) => {
                        Self::dispatch_frame(&frame, &reader_pending, &reader_writer_tx).await;
                    }
                    Ok(None) => {
                        tracing::info!("backend closed its output stream");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("reader error: {e}");
                        break;
                    }
                }
            }
            // Surface the dead transport to every in-flight caller.
            let mut pending = reader_pending.lock().await;
            for (_, tx) in pending.drain() {
                let _ = tx.send(Err(LspError::ConnectionClosed));
            }
        });

        Self {
            state: StdMutex::new(SessionState::Initializing),
            next_id: AtomicU64::new(0),
            pending,
            capabilities: OnceLock::new(),
            writer_tx,
            request_timeout,
            supervisor: Mutex::new(supervisor),
            reader_handle: Mutex::new(Some(reader_handle)),
            writer_handle: Mutex::new(Some(writer_handle)),
        }
    }

    /// Route one decoded frame.
    async fn dispatch_frame(
        frame: &serde_json::Value,
        pending: &Mutex<HashMap<u64, oneshot::Sender<Result<serde_json::Value, LspError>>>>,
        writer_tx: &mpsc::Sender<WriterCommand>,
    ) {
        let Some(incoming) = protocol::classify(frame) else {
            tracing::debug!("ignoring malformed JSON-RPC frame");
            return;
        };

        match incoming {
            Incoming::Reply { id, result, error } => {
                let slot = pending.lock().await.remove(&id);
                let Some(tx) = slot else {
                    // Late reply for a timed-out request: drop as orphaned.
                    tracing::debug!(id, "dropping reply with no pending request");
                    return;
                };
                let outcome = match error {
                    Some(e) => Err(LspError::Backend {
                        code: e.code,
                        message: e.message,
                    }),
                    None => Ok(result.unwrap_or(serde_json::Value::Null)),
                };
                let _ = tx.send(outcome);
            }
            Incoming::ServerRequest { id, method } => {
                // Some backends send client/registerCapability or
                // workspace/configuration and block on the answer.
                tracing::debug!(%method, "replying method-not-found to server request");
                let response = serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": {
                        "code": -32601,
                        "message": format!("Method not found: {method}")
                    }
                });
                let _ = writer_tx.send(WriterCommand::Send(response)).await;
            }
            Incoming::Notification { method, params } => {
                match ServerNotice::from_wire(&method, params) {
                    ServerNotice::PublishDiagnostics(p) => {
                        // Received, not persisted: diagnostics stream past us.
                        tracing::debug!(uri = %p.uri, count = p.diagnostics.len(), "diagnostics published");
                    }
                    ServerNotice::LogMessage { message } => {
                        tracing::debug!(backend_log = %message);
                    }
                    ServerNotice::Unknown { method } => {
                        tracing::debug!(%method, "ignoring unrecognized notification");
                    }
                }
            }
        }
    }

    /// Guard a request against the current lifecycle state.
    fn check_sendable(&self, method: &str) -> Result<(), LspError> {
        let state = *self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let allowed = match state {
            SessionState::Ready => true,
            SessionState::Initializing => method == "initialize" || method == "initialized",
            SessionState::ShuttingDown => method == "shutdown" || method == "exit",
            SessionState::Closed => false,
        };
        if allowed {
            Ok(())
        } else {
            Err(LspError::NotReady {
                method: method.to_string(),
                state: state.name(),
            })
        }
    }

    fn set_state(&self, state: SessionState) {
        *self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = state;
    }

    /// Send a request and await its correlated reply.
    ///
    /// The result slot is registered before the frame is enqueued, so a
    /// fast reply can never race the registration. On timeout the slot is
    /// removed; the backend's eventual late reply is dropped as orphaned.
    pub async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, LspError> {
        self.check_sendable(method)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        let frame = serde_json::to_value(Request::new(id, method, params))
            .map_err(|e| LspError::Protocol(format!("serializing request: {e}")))?;
        if self.writer_tx.send(WriterCommand::Send(frame)).await.is_err() {
            self.pending.lock().await.remove(&id);
            return Err(LspError::ConnectionClosed);
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => {
                // Reader task dropped the slot without resolving it.
                self.pending.lock().await.remove(&id);
                Err(LspError::ConnectionClosed)
            }
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(LspError::Timeout {
                    method: method.to_string(),
                    seconds: self.request_timeout.as_secs(),
                })
            }
        }
    }

    /// Send a notification: no id, no awaited reply.
    pub async fn notify(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<(), LspError> {
        self.check_sendable(method)?;
        let frame = serde_json::to_value(Notification::new(method, params))
            .map_err(|e| LspError::Protocol(format!("serializing notification: {e}")))?;
        self.writer_tx
            .send(WriterCommand::Send(frame))
            .await
            .map_err(|_| LspError::ConnectionClosed)
    }

    /// Perform the `initialize`/`initialized` handshake and flip to ready.
    pub(crate) async fn initialize(&self, workspace_root: &Path) -> Result<(), LspError> {
        let root_uri = protocol::path_to_file_uri(workspace_root)?;
        let params = protocol::initialize_params(root_uri.as_str(), workspace_root);

        let result = self.request("initialize", Some(params)).await?;
        let capabilities = result
            .get("capabilities")
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        let _ = self.capabilities.set(capabilities);

        self.notify("initialized", Some(serde_json::json!({}))).await?;

        self.set_state(SessionState::Ready);
        tracing::info!("session initialized");
        Ok(())
    }

    /// Backend-advertised capabilities, captured during the handshake.
    pub fn capabilities(&self) -> Option<&serde_json::Value> {
        self.capabilities.get()
    }

    /// Whether the handshake completed and requests may be sent.
    pub fn is_ready(&self) -> bool {
        *self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
            == SessionState::Ready
    }

    /// Best-effort graceful shutdown.
    ///
    /// Sends `shutdown`/`exit`, stops the writer, cancels the reader task
    /// and awaits it, then escalates on the child process. Failures along
    /// the way are logged, never re-raised — the backend may already be
    /// gone.
    pub async fn shutdown(&self) {
        self.set_state(SessionState::ShuttingDown);

        match self.request("shutdown", None).await {
            Ok(_) => {
                if let Err(e) = self.notify("exit", None).await {
                    tracing::debug!("exit notification failed: {e}");
                }
            }
            Err(e) => tracing::debug!("graceful shutdown request failed: {e}"),
        }

        let _ = self.writer_tx.send(WriterCommand::Shutdown).await;

        if let Some(handle) = self.reader_handle.lock().await.take() {
            handle.abort();
            let _ = handle.await;
        }
        if let Some(handle) = self.writer_handle.lock().await.take() {
            let _ = handle.await;
        }

        self.supervisor.lock().await.stop().await;
        self.set_state(SessionState::Closed);
        tracing::info!("session closed");
    }
}

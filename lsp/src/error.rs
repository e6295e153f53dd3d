//! Error taxonomy for the LSP client core.
//!
//! [`LspError`] covers transport and request failures; [`PlanError`] covers
//! workspace-edit application failures. The two are deliberately separate:
//! edit application never talks to the wire directly, and callers need to
//! distinguish "the backend misbehaved" from "the plan was bad".

use std::path::PathBuf;

/// Transport, lifecycle, and request failures.
#[derive(Debug, thiserror::Error)]
pub enum LspError {
    /// No candidate executable resolved. Fatal to session startup.
    #[error("backend executable '{command}' not found (install with: npm install -g pyright)")]
    BackendNotFound { command: String },

    /// A request was issued in a session state that does not permit it.
    #[error("session not ready for '{method}' (state: {state})")]
    NotReady { method: String, state: &'static str },

    /// The pending slot was not resolved within the request ceiling.
    #[error("request '{method}' timed out after {seconds}s")]
    Timeout { method: String, seconds: u64 },

    /// The backend returned an error payload for this request.
    #[error("backend error {code}: {message}")]
    Backend { code: i64, message: String },

    /// The writer channel or the reader task is gone.
    #[error("backend connection closed")]
    ConnectionClosed,

    /// Malformed frame or other wire-level corruption.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A path could not be represented as a file URI.
    #[error("cannot convert path to file URI: {}", path.display())]
    PathToUri { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures while parsing or applying a workspace edit plan.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The plan matched neither the `changes` nor the `documentChanges` shape.
    #[error("malformed edit plan: expected 'changes' or 'documentChanges'")]
    Malformed,

    /// A plan URI did not resolve to a local file path.
    #[error("unsupported edit target URI: {uri}")]
    BadUri { uri: String },

    /// A referenced file does not exist on disk.
    #[error("edit target does not exist: {}", path.display())]
    MissingTarget { path: PathBuf },

    /// An edit's range ends before it starts.
    #[error("edit range end precedes its start in {}", path.display())]
    ReversedRange { path: PathBuf },

    /// Two edits in one file's list cover overlapping ranges.
    #[error("overlapping edit ranges for {}", path.display())]
    OverlappingEdits { path: PathBuf },

    /// Reading or writing an edit target failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lsp_error_messages_are_readable() {
        let e = LspError::BackendNotFound {
            command: "pyright-langserver".to_string(),
        };
        assert!(e.to_string().contains("pyright-langserver"));

        let e = LspError::Timeout {
            method: "textDocument/rename".to_string(),
            seconds: 30,
        };
        assert!(e.to_string().contains("timed out after 30s"));
    }

    #[test]
    fn plan_error_messages_name_the_target() {
        let e = PlanError::MissingTarget {
            path: PathBuf::from("/tmp/gone.py"),
        };
        assert!(e.to_string().contains("/tmp/gone.py"));

        let e = PlanError::Malformed;
        assert!(e.to_string().contains("documentChanges"));
    }
}

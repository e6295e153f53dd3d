//! Document sync: keeps the backend's view of file contents matching disk.
//!
//! Whole-document sync only — every change notification carries the full
//! replacement text. Simpler and correct, not bandwidth-optimal.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::LspError;
use crate::protocol;
use crate::session::Session;

struct Registry {
    /// Canonical absolute paths currently believed open in the backend.
    open: HashSet<PathBuf>,
    /// Per-document version counter for didChange.
    versions: HashMap<PathBuf, i32>,
}

/// Tracks which files are open in the backend's model and issues
/// open/change/close notifications through the session.
///
/// All operations are idempotent with respect to repeated calls for the
/// same file in the same state.
pub struct DocumentSync {
    session: Arc<Session>,
    language_id: String,
    registry: Mutex<Registry>,
}

impl DocumentSync {
    pub fn new(session: Arc<Session>, language_id: String) -> Self {
        Self {
            session,
            language_id,
            registry: Mutex::new(Registry {
                open: HashSet::new(),
                versions: HashMap::new(),
            }),
        }
    }

    /// Canonical identity for the open set: absolute, symlink-free.
    async fn canonical(path: &Path) -> Result<PathBuf, LspError> {
        Ok(tokio::fs::canonicalize(path).await?)
    }

    /// Open `path` in the backend if it is not already tracked.
    ///
    /// Reads the current on-disk content and sends it in full with an
    /// initial version stamp. No-op for already-open files.
    pub async fn ensure_open(&self, path: &Path) -> Result<(), LspError> {
        let canonical = Self::canonical(path).await?;

        let mut registry = self.registry.lock().await;
        if registry.open.contains(&canonical) {
            return Ok(());
        }

        let text = tokio::fs::read_to_string(&canonical).await?;
        let uri = protocol::path_to_file_uri(&canonical)?;

        registry.versions.insert(canonical.clone(), 1);
        self.session
            .notify(
                "textDocument/didOpen",
                Some(protocol::did_open_params(uri.as_str(), &self.language_id, 1, &text)),
            )
            .await?;
        registry.open.insert(canonical);
        tracing::debug!(uri = %uri, "opened document");
        Ok(())
    }

    /// Tell the backend `path` now has content `new_text`.
    ///
    /// Self-healing: if the file is not tracked, it is opened first (with
    /// its on-disk content) before the change notification goes out.
    pub async fn notify_changed(&self, path: &Path, new_text: &str) -> Result<(), LspError> {
        let canonical = Self::canonical(path).await?;

        if !self.registry.lock().await.open.contains(&canonical) {
            tracing::debug!(path = %canonical.display(), "change for untracked document, re-opening");
            self.ensure_open(&canonical).await?;
        }

        let uri = protocol::path_to_file_uri(&canonical)?;
        let version = {
            let mut registry = self.registry.lock().await;
            let version = registry.versions.entry(canonical).or_insert(1);
            *version += 1;
            *version
        };

        self.session
            .notify(
                "textDocument/didChange",
                Some(protocol::did_change_params(uri.as_str(), version, new_text)),
            )
            .await?;
        tracing::debug!(uri = %uri, version, "notified change");
        Ok(())
    }

    /// Close `path` in the backend. No-op for untracked files.
    pub async fn close(&self, path: &Path) -> Result<(), LspError> {
        let canonical = Self::canonical(path).await?;

        let mut registry = self.registry.lock().await;
        if !registry.open.contains(&canonical) {
            return Ok(());
        }

        let uri = protocol::path_to_file_uri(&canonical)?;
        self.session
            .notify(
                "textDocument/didClose",
                Some(protocol::did_close_params(uri.as_str())),
            )
            .await?;
        registry.open.remove(&canonical);
        registry.versions.remove(&canonical);
        tracing::debug!(uri = %uri, "closed document");
        Ok(())
    }

    /// Number of documents currently tracked as open.
    pub async fn open_count(&self) -> usize {
        self.registry.lock().await.open.len()
    }
}

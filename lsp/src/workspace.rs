//! High-level workspace operations over one backend session.
//!
//! The facade the MCP layer calls into. Navigation queries degrade to
//! `null`/empty results when the backend has nothing to say; only
//! [`Workspace::apply_edit`] ever writes to disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::edit::{self, EditPlan};
use crate::error::{LspError, PlanError};
use crate::process::BackendConfig;
use crate::protocol;
use crate::session::Session;
use crate::sync::DocumentSync;

pub struct Workspace {
    root: PathBuf,
    session: Arc<Session>,
    docs: DocumentSync,
}

impl Workspace {
    /// Spawn the configured backend for `root` and complete the handshake.
    pub async fn connect(config: &BackendConfig, root: &Path) -> Result<Self, LspError> {
        let root = tokio::fs::canonicalize(root).await?;
        let session = Arc::new(Session::connect(config, &root).await?);
        let docs = DocumentSync::new(session.clone(), config.language_id.clone());
        Ok(Self { root, session, docs })
    }

    #[cfg(test)]
    pub(crate) fn over_session(root: PathBuf, session: Arc<Session>, language_id: &str) -> Self {
        let docs = DocumentSync::new(session.clone(), language_id.to_string());
        Self { root, session, docs }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Server capabilities captured during the handshake.
    pub fn capabilities(&self) -> Option<&serde_json::Value> {
        self.session.capabilities()
    }

    /// Open the document (if needed) and return its file URI.
    ///
    /// The URI is built from the canonical path so queries use the same
    /// identity the open notification carried.
    async fn prepare(&self, path: &Path) -> Result<url::Url, LspError> {
        let canonical = tokio::fs::canonicalize(path).await?;
        self.docs.ensure_open(&canonical).await?;
        protocol::path_to_file_uri(&canonical)
    }

    /// Definition site(s) of the symbol at a position. `null` when the
    /// backend finds nothing.
    pub async fn goto_definition(
        &self,
        path: &Path,
        line: u32,
        character: u32,
    ) -> Result<serde_json::Value, LspError> {
        let uri = self.prepare(path).await?;
        let params = protocol::position_params(uri.as_str(), line, character);
        self.session
            .request("textDocument/definition", Some(params))
            .await
    }

    /// All references to the symbol at a position. Empty array when the
    /// backend finds nothing.
    pub async fn find_references(
        &self,
        path: &Path,
        line: u32,
        character: u32,
        include_declaration: bool,
    ) -> Result<serde_json::Value, LspError> {
        let uri = self.prepare(path).await?;
        let mut params = protocol::position_params(uri.as_str(), line, character);
        params["context"] = serde_json::json!({ "includeDeclaration": include_declaration });
        self.session
            .request("textDocument/references", Some(params))
            .await
    }

    /// Hover documentation at a position, `null` when none exists.
    pub async fn hover(
        &self,
        path: &Path,
        line: u32,
        character: u32,
    ) -> Result<serde_json::Value, LspError> {
        let uri = self.prepare(path).await?;
        let params = protocol::position_params(uri.as_str(), line, character);
        self.session.request("textDocument/hover", Some(params)).await
    }

    /// Compute a rename plan for the symbol at a position.
    ///
    /// Returns the raw WorkspaceEdit describing every change the rename
    /// would make. Nothing is written: the plan must go back through
    /// [`Workspace::apply_edit`] explicitly.
    pub async fn rename(
        &self,
        path: &Path,
        line: u32,
        character: u32,
        new_name: &str,
    ) -> Result<serde_json::Value, LspError> {
        let uri = self.prepare(path).await?;
        let mut params = protocol::position_params(uri.as_str(), line, character);
        params["newName"] = serde_json::Value::String(new_name.to_string());
        self.session.request("textDocument/rename", Some(params)).await
    }

    /// Code actions available for a range, optionally filtered by kind
    /// prefix (e.g. `"refactor"`).
    pub async fn code_actions(
        &self,
        path: &Path,
        start: (u32, u32),
        end: (u32, u32),
        kind: Option<&str>,
    ) -> Result<serde_json::Value, LspError> {
        let uri = self.prepare(path).await?;
        let mut context = serde_json::json!({ "diagnostics": [] });
        if let Some(kind) = kind {
            context["only"] = serde_json::json!([kind]);
        }
        let params = serde_json::json!({
            "textDocument": { "uri": uri.as_str() },
            "range": {
                "start": { "line": start.0, "character": start.1 },
                "end": { "line": end.0, "character": end.1 }
            },
            "context": context
        });
        self.session
            .request("textDocument/codeAction", Some(params))
            .await
    }

    /// Apply a WorkspaceEdit to disk. The only write path.
    ///
    /// Returns the files that were modified. Files written before a
    /// failure stay written.
    pub async fn apply_edit(&self, edit: &serde_json::Value) -> Result<Vec<PathBuf>, PlanError> {
        let plan = EditPlan::from_value(edit)?;
        edit::apply_plan(&plan, &self.docs).await
    }

    /// Trigger analysis of a file.
    ///
    /// Diagnostics arrive asynchronously as notifications and are not
    /// collected here; opening the document is what prompts the backend to
    /// publish them.
    pub async fn diagnostics(&self, path: &Path) -> Result<serde_json::Value, LspError> {
        self.docs.ensure_open(path).await?;
        Ok(serde_json::json!({
            "status": "analysis triggered",
            "note": "diagnostics are published asynchronously by the backend \
                     and surfaced in the bridge log"
        }))
    }

    /// Tear the session down; safe to call on an already-dead backend.
    pub async fn shutdown(&self) {
        self.session.shutdown().await;
    }
}

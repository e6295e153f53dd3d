//! Backend subprocess supervisor.
//!
//! Locates the analysis backend executable, spawns it with all three stdio
//! streams piped, and tears it down with bounded escalation.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::error::LspError;

/// Grace period for the child to exit after graceful shutdown before it is
/// forcefully killed.
const STOP_GRACE_SECS: u64 = 2;

/// Configuration for the backend analysis process.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Executable command (e.g. "pyright-langserver").
    pub command: String,
    /// Arguments to pass to the command.
    #[serde(default)]
    pub args: Vec<String>,
    /// LSP language identifier sent in didOpen notifications.
    pub language_id: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            command: "pyright-langserver".to_string(),
            args: vec!["--stdio".to_string()],
            language_id: "python".to_string(),
        }
    }
}

/// Well-known install locations checked after the search path.
fn fallback_candidates(command: &str) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".npm-global/bin").join(command));
        candidates.push(home.join(".local/bin").join(command));
    }
    candidates.push(PathBuf::from("/usr/local/bin").join(command));
    candidates.push(PathBuf::from("/opt/homebrew/bin").join(command));
    candidates
}

/// Resolve the backend executable: search path first, then the fixed list
/// of well-known install locations.
fn locate(command: &str) -> Result<PathBuf, LspError> {
    if let Ok(path) = which::which(command) {
        return Ok(path);
    }
    fallback_candidates(command)
        .into_iter()
        .find(|p| p.is_file())
        .ok_or_else(|| LspError::BackendNotFound {
            command: command.to_string(),
        })
}

/// Owns the backend child process.
///
/// Stdin and stdout are handed off to the transport at spawn time; stderr
/// stays piped so a noisy backend cannot corrupt our own stdio.
pub(crate) struct Supervisor {
    child: Option<Child>,
}

impl Supervisor {
    /// Spawn the backend and return the supervisor plus its stream ends.
    ///
    /// Fails with [`LspError::BackendNotFound`] if no candidate resolves;
    /// this is fatal to session startup and is not retried.
    pub fn start(config: &BackendConfig) -> Result<(Self, ChildStdin, ChildStdout), LspError> {
        let resolved = locate(&config.command)?;
        tracing::info!(command = %resolved.display(), "starting backend");

        let mut child = Command::new(&resolved)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| LspError::Protocol("no stdin from backend".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| LspError::Protocol("no stdout from backend".to_string()))?;

        Ok((Self { child: Some(child) }, stdin, stdout))
    }

    /// A supervisor with no process, for sessions built over raw streams.
    pub fn detached() -> Self {
        Self { child: None }
    }

    /// Wait briefly for the child to exit, then kill it.
    ///
    /// Never hangs and never fails: calling this on a process that was
    /// never started (or already stopped) is a no-op. The graceful LSP
    /// shutdown/exit exchange happens before this, at the session layer.
    pub async fn stop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        match tokio::time::timeout(Duration::from_secs(STOP_GRACE_SECS), child.wait()).await {
            Ok(Ok(status)) => {
                tracing::debug!(%status, "backend exited");
            }
            Ok(Err(e)) => {
                tracing::debug!("error waiting for backend: {e}");
            }
            Err(_) => {
                tracing::debug!("backend did not exit in time, killing");
                if let Err(e) = child.kill().await {
                    tracing::debug!("failed to kill backend: {e}");
                }
            }
        }
    }
}

//! refactor-mcp binary: serves the MCP tool surface over stdio, backed by a
//! language server spawned for one workspace.
//!
//! stdout belongs to the MCP transport, so all logging goes to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use rmcp::ServiceExt;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use refactor_lsp::{BackendConfig, Workspace};
use refactor_mcp::RefactorService;

#[derive(Debug, Parser)]
#[command(name = "refactor-mcp", version, about = "MCP refactoring server backed by a language server")]
struct Cli {
    /// Root directory of the workspace to analyze
    workspace_root: PathBuf,

    /// Language server executable to spawn
    #[arg(long, default_value = "pyright-langserver")]
    backend: String,

    /// Arguments passed to the language server
    #[arg(long, default_value = "--stdio", allow_hyphen_values = true)]
    backend_args: Vec<String>,

    /// Language id sent with opened documents
    #[arg(long, default_value = "python")]
    language_id: String,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    if !cli.workspace_root.is_dir() {
        bail!(
            "workspace root {} is not a directory",
            cli.workspace_root.display()
        );
    }

    let config = BackendConfig {
        command: cli.backend,
        args: cli.backend_args,
        language_id: cli.language_id,
    };

    let workspace = Workspace::connect(&config, &cli.workspace_root)
        .await
        .context("failed to start the language server backend")?;
    let workspace = Arc::new(workspace);
    tracing::info!(root = %workspace.root().display(), "backend ready");

    let service = RefactorService::new(workspace.clone())
        .serve((tokio::io::stdin(), tokio::io::stdout()))
        .await
        .context("failed to start MCP server on stdio")?;
    service.waiting().await?;

    workspace.shutdown().await;
    Ok(())
}

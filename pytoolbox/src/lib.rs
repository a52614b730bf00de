//! pytoolbox: MCP server for one Python workspace.
//!
//! Binds file operations, analysis, project management and sandboxed
//! execution to a single workspace root and serves them as MCP tools.

mod cli;
pub mod mcp;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use cli::Cli;
use pytoolbox_core::config::{load_dotenv, PathsConfig};
use pytoolbox_core::{observability, WorkspaceRoot};

/// Run the CLI: resolve the workspace and serve until stdin closes.
pub fn run_cli() -> Result<()> {
    load_dotenv();
    observability::init_tracing();
    let cli = Cli::parse();

    let workspace = cli
        .workspace
        .or_else(|| PathsConfig::from_env().workspace.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    let root = WorkspaceRoot::new(&workspace)
        .with_context(|| format!("Invalid workspace: {}", workspace.display()))?;

    let server = mcp::ToolServer::from_env(root);
    tracing::info!(
        workspace = %server.workspace_root().display(),
        tools = ?server.enabled().iter().map(|t| t.name()).collect::<Vec<_>>(),
        "pytoolbox MCP server ready"
    );
    mcp::serve_stdio(&server)
}

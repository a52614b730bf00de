use clap::Parser;
use std::path::PathBuf;

/// pytoolbox - Python project tools for one workspace, served over MCP stdio
#[derive(Parser, Debug)]
#[command(name = "pytoolbox")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Workspace root every tool is confined to
    /// (default: PYTOOLBOX_WORKSPACE, then the current directory)
    #[arg(long, value_name = "DIR")]
    pub workspace: Option<PathBuf>,
}

use clap::Parser;
use std::path::PathBuf;

use crate::config::AppConfig;

/// MCP tool server for documents, SQLite, the local filesystem and GitHub.
///
/// Speaks JSON-RPC over stdio; logs go to stderr.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.universal-mcp/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Flags win over every other configuration source.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(path) = &self.database {
            config.database.path = path.clone();
        }
        if self.debug {
            config.server.debug = true;
        }
    }
}

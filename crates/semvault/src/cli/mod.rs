//! CLI definition and command handling

pub mod commands;

use clap::{Parser, Subcommand};

use commands::{CheckCommand, GetCommand, PutCommand};

/// Semvault - semantic-version resource for CI pipelines
///
/// Every subcommand reads a JSON request on stdin and writes a JSON
/// response on stdout; logs go to stderr.
#[derive(Debug, Parser)]
#[command(name = "semvault")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Report versions newer than the caller's cursor
    Check(CheckCommand),

    /// Materialize a version (with an optional local bump) into a directory
    #[command(name = "in")]
    In(GetCommand),

    /// Persist a new version to the source of truth
    #[command(name = "out")]
    Out(PutCommand),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Check(cmd) => cmd.execute().await,
            Commands::In(cmd) => cmd.execute().await,
            Commands::Out(cmd) => cmd.execute().await,
        }
    }
}

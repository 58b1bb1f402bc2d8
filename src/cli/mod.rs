//! CLI module for Libris
//!
//! Provides command-line interface for:
//! - serve: Start the HTTP server
//! - query: One-shot list query
//! - explain: One-shot query plan

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{build_handler, explain, open_store, parse_params, query, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};

/// Parse arguments and run the selected command
pub async fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command).await
}

//! CLI argument definitions using clap
//!
//! Commands:
//! - libris serve --config <path> [--port <port>]
//! - libris query --config <path> --resource <name> [--param key=value]...
//! - libris explain --config <path> --resource <name> [--param key=value]...

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::http_server::DEFAULT_CONFIG_PATH;

/// Libris - index-guarded list queries over a book catalogue
#[derive(Parser, Debug)]
#[command(name = "libris")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run a single list query and print the page
    Query {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Resource name, e.g. `book`
        #[arg(long)]
        resource: String,

        /// Request parameter as key=value, repeatable
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Validate a list query and print its plan without running it
    Explain {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Resource name, e.g. `book`
        #[arg(long)]
        resource: String,

        /// Request parameter as key=value, repeatable
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

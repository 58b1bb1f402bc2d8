//! Libris CLI entry point
//!
//! Installs the log subscriber, delegates to `cli::run`, prints errors to
//! stderr and exits non-zero on failure.

use libris::cli;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "libris=info,tower_http=info";

#[tokio::main]
async fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::run().await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

//! Semvault - semantic-version resource for CI pipelines

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use cli::Cli;

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    if let Err(err) = cli.execute().await {
        // One line, stderr: "error <doing>: <cause>: ..."
        eprintln!("error {err:#}");
        std::process::exit(1);
    }
}

/// Set up tracing on stderr, controlled by RUST_LOG (default: warn).
/// Stdout stays reserved for the protocol response.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(filter),
        )
        .init();
}

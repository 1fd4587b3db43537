//! Boxfile CLI entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;
mod setup;

use args::Cli;

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(e) = setup::execute(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

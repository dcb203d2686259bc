//! mirna-dx - Main Entry Point
//!
//! Runs the three-subset diagnostic study on a data folder.

use clap::Parser;
use mirna_dx::cli::{cmd_run, Cli};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mirna_dx=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    cmd_run(&cli)?;

    Ok(())
}

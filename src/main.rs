//! RepoMaster - repository assistant launcher
//!
//! CLI entry point for setup, validation and launching.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let default_filter = if cli.verbose() { "repomaster=debug" } else { "repomaster=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!("RepoMaster launcher v{}", env!("CARGO_PKG_VERSION"));

    let code = cli::run(cli).await?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

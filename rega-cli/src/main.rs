//! Rega field client
//!
//! Usage:
//!   rega login <user-id>
//!   rega register --documento 1001 --nombres Ana --apellidos Ruiz
//!   rega sync
//!
//! Logging honours `RUST_LOG`; `--verbose` lowers the default to debug.

use anyhow::Result;
use clap::Parser;
use rega_cli::{Cli, commands};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    commands::run(cli).await
}

//! Rega hub
//!
//! Serves the document collections (`persons`, `users`, `departments`,
//! `config`) that field devices synchronize against.
//!
//! Usage:
//!   rega-hub --port 8787
//!
//! Documents live in memory for the lifetime of the process.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rega_hub::{HubState, build_router};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "rega-hub")]
#[command(about = "Document store hub for Rega field devices")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8787")]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Require this bearer token on collection routes
    #[arg(long)]
    token: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let mut hub = HubState::new();
    if let Some(token) = args.token {
        hub = hub.with_token(token);
    }
    let app = build_router(Arc::new(hub));

    let addr = format!("{}:{}", args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Rega hub listening on {addr}");
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}

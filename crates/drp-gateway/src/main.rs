//! drp-gateway — the decentralized proof-anchoring gateway binary.
//!
//! Startup sequence:
//!   1. Parse configuration (flags with `env` fallbacks, §6)
//!   2. Open (or initialize) every keystore, the consent table, the
//!      embedded metadata index, and the audit log
//!   3. Bootstrap the Elder quorum if no key file exists yet
//!   4. Serve the HTTP surface (§6) until terminated

mod app;
mod config;
mod errors;
mod http;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use app::AppState;
use config::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,drp=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    info!("drp-gateway starting");

    let state = AppState::build(&args)
        .await
        .context("building application state")?;

    let router = http::router(state.clone());

    let listener = tokio::net::TcpListener::bind(args.http_addr)
        .await
        .with_context(|| format!("binding HTTP listener on {}", args.http_addr))?;
    info!(addr = %args.http_addr, "HTTP surface listening");

    let shutdown_state = state.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            shutdown_state.shutdown().await;
        })
        .await
        .context("running HTTP server")?;

    Ok(())
}

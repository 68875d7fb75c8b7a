//! loopsync — pulls Loopio library entries and creates them as OCM items.
//!
//! The service exposes a trigger endpoint (by default `GET /cron` and
//! `GET /test`) meant to be called by an external scheduler.  Each call:
//!
//! 1. Obtains a Loopio bearer token (cached for its lifetime).
//! 2. Fetches one page of library entries matching the configured filter.
//! 3. Maps every entry to an OCM asset and creates them all concurrently.
//! 4. Answers `201` with a report once every submission has settled.
//!
//! `--once` runs a single sync from the command line instead of serving.

mod config;
mod error;
mod pipeline;
mod routes;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use crate::config::AppConfig;
use crate::pipeline::SyncPipeline;
use crate::routes::AppState;

/// Loopio → Oracle Content Management sync service.
#[derive(Parser, Debug)]
#[command(name = "loopsync", about = "Loopio → OCM sync service")]
struct Args {
    /// Run a single sync, print the report as JSON and exit.
    #[arg(long)]
    once: bool,

    /// Listen port (overrides `PORT`).
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging (controlled via RUST_LOG env var).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(port) = args.port {
        config.listen_port = port;
    }

    info!(
        loopio = %config.loopio.entries_url(),
        ocm = %config.ocm.items_url(),
        repository_id = %config.ocm.repository_id,
        page_size = config.loopio.page_size,
        filter = %config.loopio.filter.to_query(),
        asset_type = %config.field_map.asset_type,
        rules = config.field_map.fields.len(),
        "sync configured"
    );
    if config.loopio.client_id.is_empty() || config.loopio.client_secret.is_empty() {
        tracing::warn!("LOOPIO_CLIENT_ID / LOOPIO_CLIENT_SECRET not set; token requests will fail");
    }

    let pipeline = SyncPipeline::from_config(&config)?;

    if args.once {
        let report = pipeline.run().await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let state = Arc::new(AppState { pipeline });
    let app = routes::router(state, &config.trigger_paths);

    let addr = format!("0.0.0.0:{}", config.listen_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(address = %addr, triggers = ?config.trigger_paths, "sync service listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

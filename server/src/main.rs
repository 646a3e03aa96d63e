//! GeoPhoto server binary.

use anyhow::{Context, Result};
use clap::Parser;
use geophoto_server::{create_router, AppConfig, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// GeoPhoto - geotagged photo ingestion and bounding-box search
#[derive(Parser, Debug)]
#[command(name = "geophotod")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "GEOPHOTO_CONFIG",
        default_value = "config/server.toml"
    )]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("GeoPhoto v{}", env!("CARGO_PKG_VERSION"));

    // File is optional; env vars can provide or override everything
    let config = AppConfig::load(&args.config)?;

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    let max_concurrent_requests = config.server.max_concurrent_requests;

    let state = AppState::from_config(config)?;
    let app = create_router(state);

    tracing::info!(
        max_concurrent_requests,
        "Listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use std::{net::SocketAddr, sync::Arc};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod handler;
mod headers;
mod upstream;

use config::RelayConfig;

#[derive(Clone)]
pub struct AppState {
    client: reqwest::Client,
    config: Arc<RelayConfig>,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Result<Self> {
        let client = upstream::build_client(config.connect_timeout())?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }
}

/// Every path lands on the relay handler
pub fn app(state: AppState) -> Router {
    Router::new().fallback(handler::relay).with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = RelayConfig::parse();

    let default_filter = if config.verbose { "flyt_relay=debug" } else { "flyt_relay=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(config)?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Flyt relay listening on {}", addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}

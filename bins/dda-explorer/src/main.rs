mod config;
mod routes;
mod stats;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use dda_core::NetworkParams;
use dda_rpc::RpcClient;

#[derive(Clone)]
pub struct AppState {
    pub rpc: Arc<RpcClient>,
    pub config: Arc<config::Config>,
    pub params: &'static NetworkParams,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Arc::new(config::Config::from_env()?);
    let rpc = Arc::new(RpcClient::new(config.rpc_config()).context("Failed to build RPC client")?);

    info!(
        network = %config.network,
        rpc = %config.rpc_url,
        bind = %config.bind_addr,
        "Starting dda-explorer"
    );

    let state = AppState {
        rpc,
        params: config.network.params(),
        config: config.clone(),
    };
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Explorer listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

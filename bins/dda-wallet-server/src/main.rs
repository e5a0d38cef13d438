//! dda-wallet-server — DDACOIN web wallet.
//!
//! Serves a web UI at `/` and a JSON API under `/api/` backed by a DDACOIN
//! node's JSON-RPC interface. Keys live only in memory, inside a session
//! bound to an httpOnly cookie; balances are recomputed from the node's
//! address index on every request.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

mod config;
mod error;
mod prefs;
mod qr;
mod routes;
mod send;

use config::Config;
use dda_core::NetworkParams;
use dda_rpc::RpcClient;
use dda_wallet::{InMemorySessionStore, SessionStore};
use prefs::PrefsStore;
use send::SendLocks;

/// How often expired sessions and idle send locks are swept.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Shared application state passed to every Axum handler.
#[derive(Clone)]
pub struct AppState {
    /// Node JSON-RPC client.
    pub rpc: Arc<RpcClient>,
    /// Active sessions keyed by cookie token.
    pub sessions: Arc<dyn SessionStore>,
    /// Server configuration.
    pub config: Arc<Config>,
    /// Active chain parameters.
    pub params: &'static NetworkParams,
    /// Per-session send serialization.
    pub send_locks: Arc<SendLocks>,
    /// Non-secret preferences file.
    pub prefs: Arc<PrefsStore>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("Failed to load wallet configuration")?;
    let params = config.network.params();
    let rpc_config = config.rpc_config();

    info!(
        network = %config.network,
        rpc = %rpc_config.url,
        bind = %config.bind_addr,
        send_lock = config.send_lock,
        "Starting dda-wallet-server"
    );

    let rpc = RpcClient::new(rpc_config).context("Failed to build RPC client")?;
    let sessions = Arc::new(InMemorySessionStore::new());
    let prefs = PrefsStore::open(config.data_dir.as_deref());

    let send_locks = Arc::new(SendLocks::new(config.send_lock));

    let (sweep_sessions, sweep_locks) = (Arc::clone(&sessions), Arc::clone(&send_locks));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            send::sweep(&sweep_sessions, &sweep_locks);
        }
    });

    let state = AppState {
        rpc: Arc::new(rpc),
        sessions,
        params,
        send_locks,
        prefs: Arc::new(prefs),
        config: Arc::new(config.clone()),
    };

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!("DDACOIN wallet listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .context("HTTP server error")?;

    Ok(())
}

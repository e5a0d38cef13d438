//! Wallet server configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, ensure};

use dda_core::Network;
use dda_core::constants::{DEFAULT_FEE_PER_KB, DEFAULT_HISTORY_LIMIT, DEFAULT_RPC_TIMEOUT_SECS};
use dda_rpc::RpcConfig;

/// Default HTTP port when neither `PORT` nor `WALLET_BIND_ADDR` is set.
pub const DEFAULT_PORT: u16 = 3080;

/// Default node host: the Docker host as seen from the wallet container.
pub const DEFAULT_RPC_HOST: &str = "host.docker.internal";

#[derive(Clone, Debug)]
pub struct Config {
    /// Active chain (`DDACOIN_NETWORK`).
    pub network: Network,
    pub rpc_host: String,
    pub rpc_port: u16,
    pub rpc_user: String,
    pub rpc_pass: String,
    /// Talk TLS to the node (its default).
    pub rpc_use_https: bool,
    /// Accept the node's self-signed certificate.
    pub rpc_accept_invalid_certs: bool,
    pub rpc_timeout: Duration,
    /// Address to bind the HTTP server.
    pub bind_addr: String,
    /// Directory of the preferences file, if any.
    pub data_dir: Option<PathBuf>,
    /// Fee rate in subunits per kilobyte.
    pub fee_per_kb: u64,
    /// Transactions requested per history lookup.
    pub history_limit: u32,
    /// Serialize sends per session.
    pub send_lock: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let network = Network::from_setting(get("DDACOIN_NETWORK").as_deref());
        let params = network.params();

        let rpc_host = get("RPC_HOST").unwrap_or_else(|| DEFAULT_RPC_HOST.to_string());
        let rpc_port = match get("RPC_PORT") {
            Some(v) => v.trim().parse().context("RPC_PORT must be a port number")?,
            None => params.default_rpc_port,
        };
        let rpc_timeout_secs: u64 = match get("RPC_TIMEOUT_SECS") {
            Some(v) => v
                .trim()
                .parse()
                .context("RPC_TIMEOUT_SECS must be a positive integer")?,
            None => DEFAULT_RPC_TIMEOUT_SECS,
        };
        ensure!(rpc_timeout_secs > 0, "RPC_TIMEOUT_SECS must be a positive integer");

        let bind_addr = match get("WALLET_BIND_ADDR") {
            Some(addr) => addr,
            None => {
                let port: u16 = match get("PORT") {
                    Some(v) => v.trim().parse().context("PORT must be a port number")?,
                    None => DEFAULT_PORT,
                };
                format!("0.0.0.0:{port}")
            }
        };

        let data_dir = get("WALLET_DATA_DIR")
            .map(PathBuf::from)
            .or_else(|| dirs::data_local_dir().map(|d| d.join("ddacoin-wallet")));

        let fee_per_kb = match get("WALLET_FEE_PER_KB") {
            Some(v) => v
                .trim()
                .parse()
                .context("WALLET_FEE_PER_KB must be a positive integer")?,
            None => DEFAULT_FEE_PER_KB,
        };
        let history_limit: u32 = match get("WALLET_HISTORY_LIMIT") {
            Some(v) => v
                .trim()
                .parse()
                .context("WALLET_HISTORY_LIMIT must be a positive integer")?,
            None => DEFAULT_HISTORY_LIMIT,
        };
        ensure!(history_limit > 0, "WALLET_HISTORY_LIMIT must be a positive integer");

        Ok(Config {
            network,
            rpc_host,
            rpc_port,
            rpc_user: get("RPC_USER").unwrap_or_default(),
            rpc_pass: get("RPC_PASS").unwrap_or_default(),
            rpc_use_https: flag(get("RPC_USE_HTTPS"), true),
            rpc_accept_invalid_certs: flag(get("RPC_ACCEPT_INVALID_CERTS"), true),
            rpc_timeout: Duration::from_secs(rpc_timeout_secs),
            bind_addr,
            data_dir,
            fee_per_kb,
            history_limit,
            send_lock: flag(get("WALLET_SEND_LOCK"), true),
        })
    }

    /// Node connection settings.
    pub fn rpc_config(&self) -> RpcConfig {
        let mut rpc = RpcConfig::from_parts(&self.rpc_host, self.rpc_port, self.rpc_use_https)
            .with_credentials(self.rpc_user.clone(), self.rpc_pass.clone())
            .with_timeout(self.rpc_timeout);
        rpc.accept_invalid_certs = self.rpc_accept_invalid_certs;
        rpc
    }
}

/// Boolean setting: `0`, `false`, `no` and `off` disable, anything else enables.
fn flag(value: Option<String>, default: bool) -> bool {
    match value {
        None => default,
        Some(v) => !matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ),
    }
}

use std::time::Duration;

use anyhow::{Context, Result, ensure};

use dda_core::Network;
use dda_core::constants::{DEFAULT_HISTORY_LIMIT, DEFAULT_RPC_TIMEOUT_SECS};
use dda_rpc::RpcConfig;

pub struct Config {
    pub network: Network,
    pub rpc_url: String,
    pub rpc_user: String,
    pub rpc_pass: String,
    pub rpc_accept_invalid_certs: bool,
    pub rpc_timeout: Duration,
    pub bind_addr: String,
    /// Transactions fetched for an address page.
    pub address_history_limit: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `RPC_URL` wins over `RPC_HOST`/`RPC_PORT`. The default host is the
    /// node's container name on the shared Docker network.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let network = Network::from_setting(get("DDACOIN_NETWORK").as_deref());
        let params = network.params();

        let rpc_url = match get("RPC_URL") {
            Some(url) => url.trim().to_string(),
            None => {
                let default_host = match network {
                    Network::Mainnet => "ddacoin-node",
                    Network::Testnet => "ddacoin-testnet-node",
                };
                let host = get("RPC_HOST").unwrap_or_else(|| default_host.into());
                let port = match get("RPC_PORT") {
                    Some(p) => p.trim().parse().context("RPC_PORT must be a port number")?,
                    None => params.default_rpc_port,
                };
                format!("https://{host}:{port}")
            }
        };

        let rpc_timeout_secs: u64 = match get("RPC_TIMEOUT_SECS") {
            Some(v) => v
                .trim()
                .parse()
                .context("RPC_TIMEOUT_SECS must be a positive integer")?,
            None => DEFAULT_RPC_TIMEOUT_SECS,
        };
        ensure!(rpc_timeout_secs > 0, "RPC_TIMEOUT_SECS must be a positive integer");

        Ok(Self {
            network,
            rpc_url,
            rpc_user: get("RPC_USER").unwrap_or_default(),
            rpc_pass: get("RPC_PASS").unwrap_or_default(),
            rpc_accept_invalid_certs: !matches!(
                get("RPC_ACCEPT_INVALID_CERTS").as_deref().map(str::trim),
                Some("0" | "false" | "no" | "off")
            ),
            rpc_timeout: Duration::from_secs(rpc_timeout_secs),
            bind_addr: get("EXPLORER_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8081".into()),
            address_history_limit: DEFAULT_HISTORY_LIMIT,
        })
    }

    pub fn rpc_config(&self) -> RpcConfig {
        let mut rpc = RpcConfig::new(self.rpc_url.clone())
            .with_credentials(self.rpc_user.clone(), self.rpc_pass.clone())
            .with_timeout(self.rpc_timeout);
        rpc.accept_invalid_certs = self.rpc_accept_invalid_certs;
        rpc
    }
}

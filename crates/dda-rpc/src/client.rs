use std::fmt;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::{RpcError, excerpt};
use crate::types::{
    BlockResponse, ChainInfo, MiningInfo, PeerInfo, RawTransaction, Verbosity,
};

/// Connection settings for one node.
#[derive(Clone)]
pub struct RpcConfig {
    /// Full endpoint URL, e.g. `https://127.0.0.1:9667`.
    pub url: String,
    pub user: String,
    pub pass: String,
    pub timeout: Duration,
    /// Accept self-signed TLS certificates (the node generates its own).
    pub accept_invalid_certs: bool,
}

impl RpcConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user: String::new(),
            pass: String::new(),
            timeout: Duration::from_secs(15),
            accept_invalid_certs: true,
        }
    }

    /// Build the endpoint URL from host, port and scheme.
    pub fn from_parts(host: &str, port: u16, use_https: bool) -> Self {
        let scheme = if use_https { "https" } else { "http" };
        Self::new(format!("{scheme}://{host}:{port}"))
    }

    pub fn with_credentials(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        self.user = user.into();
        self.pass = pass.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Both user and password are non-blank.
    pub fn has_credentials(&self) -> bool {
        !self.user.trim().is_empty() && !self.pass.trim().is_empty()
    }
}

impl fmt::Debug for RpcConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcConfig")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

/// Paging for `searchrawtransactions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub skip: u32,
    pub count: u32,
}

impl SearchOptions {
    /// The newest `count` transactions.
    pub fn first(count: u32) -> Self {
        Self { skip: 0, count }
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::first(100)
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Value,
}

fn node_error(err: Value) -> RpcError {
    let code = err.get("code").and_then(Value::as_i64);
    let message = err
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| err.to_string());
    RpcError::Node { code, message }
}

/// JSON-RPC 1.0 client. Cheap to clone; holds no per-call state.
#[derive(Clone)]
pub struct RpcClient {
    client: Client,
    config: RpcConfig,
}

impl RpcClient {
    pub fn new(config: RpcConfig) -> Result<Self, RpcError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| RpcError::Setup(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    /// Call `method` and decode its `result` as `T`.
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let value = self.call_value(method, params).await?;
        serde_json::from_value(value)
            .map_err(|e| RpcError::InvalidResponse(format!("{method}: {e}")))
    }

    /// Call `method` and return its raw `result`.
    pub async fn call_value(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let body = json!({
            "jsonrpc": "1.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let mut request = self.client.post(&self.config.url).json(&body);
        if !self.config.user.is_empty() || !self.config.pass.is_empty() {
            request = request.basic_auth(&self.config.user, Some(&self.config.pass));
        }

        let response = request.send().await.map_err(|e| {
            let err = RpcError::from_transport(e);
            warn!(method, error = %err, "rpc transport failure");
            err
        })?;
        let status = response.status();
        let text = response.text().await.map_err(RpcError::from_transport)?;
        debug!(method, status = status.as_u16(), bytes = text.len(), "rpc response");

        match status {
            StatusCode::UNAUTHORIZED => return Err(RpcError::AuthFailed),
            StatusCode::SERVICE_UNAVAILABLE => return Err(RpcError::Busy),
            _ => {}
        }

        let envelope = serde_json::from_str::<Envelope>(&text);
        if !status.is_success() {
            // btcd answers RPC errors with a 500 and a normal envelope.
            if let Ok(env) = envelope {
                if !env.error.is_null() {
                    return Err(node_error(env.error));
                }
            }
            return Err(RpcError::Http {
                status: status.as_u16(),
                body: excerpt(&text),
            });
        }

        let envelope = envelope.map_err(|e| RpcError::InvalidResponse(e.to_string()))?;
        if !envelope.error.is_null() {
            return Err(node_error(envelope.error));
        }
        Ok(envelope.result)
    }

    // ── Convenience wrappers ──────────────────────────────────────────────────

    pub async fn get_block_count(&self) -> Result<u64, RpcError> {
        self.call("getblockcount", json!([])).await
    }

    pub async fn get_block_hash(&self, height: u64) -> Result<String, RpcError> {
        self.call("getblockhash", json!([height])).await
    }

    pub async fn get_block(&self, hash: &str, verbosity: Verbosity) -> Result<BlockResponse, RpcError> {
        let value = self
            .call_value("getblock", json!([hash, verbosity as u8]))
            .await?;
        BlockResponse::decode(verbosity, value)
    }

    pub async fn get_blockchain_info(&self) -> Result<ChainInfo, RpcError> {
        self.call("getblockchaininfo", json!([])).await
    }

    pub async fn get_peer_info(&self) -> Result<Vec<PeerInfo>, RpcError> {
        self.call("getpeerinfo", json!([])).await
    }

    pub async fn get_mining_info(&self) -> Result<MiningInfo, RpcError> {
        self.call("getmininginfo", json!([])).await
    }

    /// Verbose transaction lookup.
    pub async fn get_raw_transaction(&self, txid: &str) -> Result<RawTransaction, RpcError> {
        self.call("getrawtransaction", json!([txid, 1])).await
    }

    /// Serialized transaction hex, as needed for signing inputs.
    pub async fn get_raw_transaction_hex(&self, txid: &str) -> Result<String, RpcError> {
        self.call("getrawtransaction", json!([txid, 0])).await
    }

    /// Transactions touching `address`. Requires the node's address index.
    pub async fn search_raw_transactions(
        &self,
        address: &str,
        options: SearchOptions,
    ) -> Result<Vec<RawTransaction>, RpcError> {
        let result: Option<Vec<RawTransaction>> = self
            .call(
                "searchrawtransactions",
                json!([address, 1, options.skip, options.count, 0, false]),
            )
            .await?;
        Ok(result.unwrap_or_default())
    }

    /// Broadcast a signed transaction; returns its txid.
    pub async fn send_raw_transaction(&self, hex: &str) -> Result<String, RpcError> {
        self.call("sendrawtransaction", json!([hex, false])).await
    }

    /// Verify credentials are configured and the node answers; returns the
    /// current block height.
    pub async fn check_connection(&self) -> Result<u64, RpcError> {
        if !self.config.has_credentials() {
            return Err(RpcError::MissingCredentials);
        }
        self.get_block_count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_from_parts() {
        assert_eq!(
            RpcConfig::from_parts("node", 9667, true).url,
            "https://node:9667"
        );
        assert_eq!(
            RpcConfig::from_parts("127.0.0.1", 19667, false).url,
            "http://127.0.0.1:19667"
        );
    }

    #[test]
    fn debug_redacts_password() {
        let cfg = RpcConfig::new("http://x").with_credentials("u", "hunter2");
        let shown = format!("{cfg:?}");
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("<redacted>"));
    }

    #[test]
    fn blank_credentials_are_missing() {
        assert!(!RpcConfig::new("http://x").with_credentials(" ", "p").has_credentials());
        assert!(RpcConfig::new("http://x").with_credentials("u", "p").has_credentials());
    }

    #[test]
    fn node_error_prefers_message() {
        let err = node_error(json!({ "code": -5, "message": "nope" }));
        assert!(matches!(err, RpcError::Node { code: Some(-5), ref message } if message == "nope"));
        let err = node_error(json!({ "code": -1 }));
        assert_eq!(err.to_string(), r#"{"code":-1}"#);
    }
}

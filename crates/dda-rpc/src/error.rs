//! RPC failure categories.
use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Longest HTTP body excerpt kept in [`RpcError::Http`].
pub const MAX_BODY_EXCERPT: usize = 200;

/// Node error message returned by `searchrawtransactions` for an address the
/// index has never seen.
pub const NO_ADDRESS_INFO: &str = "No information available about address";

/// Why a connection to the node could not be made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectFailure {
    Refused,
    Dns,
    Timeout,
    Other(String),
}

impl fmt::Display for ConnectFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectFailure::Refused => f.write_str(
                "Connection refused. Is the DDACOIN node running and listening on RPC host:port?",
            ),
            ConnectFailure::Dns => f.write_str(
                "Cannot resolve RPC host. On Linux try RPC_HOST=172.17.0.1 if the node runs on the host.",
            ),
            ConnectFailure::Timeout => f.write_str(
                "Timed out waiting for the node. Check RPC_HOST and RPC_PORT and that the node is reachable.",
            ),
            ConnectFailure::Other(detail) => write!(
                f,
                "Network error ({detail}). Check RPC_HOST and RPC_PORT; ensure the node is reachable."
            ),
        }
    }
}

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("{0}")]
    Unreachable(ConnectFailure),
    #[error("RPC auth failed. Set RPC_USER and RPC_PASS to match the node's --rpcuser/--rpcpass.")]
    AuthFailed,
    #[error("Node too busy (max RPC clients). Try again in a moment or increase --rpcmaxclients on the node.")]
    Busy,
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Invalid response from node: {0}")]
    InvalidResponse(String),
    #[error("{message}")]
    Node { code: Option<i64>, message: String },
    #[error("RPC_USER and RPC_PASS are not set. Set them to match the node's --rpcuser/--rpcpass.")]
    MissingCredentials,
    #[error("RPC client setup failed: {0}")]
    Setup(String),
}

impl RpcError {
    /// Whether the node reported that it has no history for an address.
    pub fn is_unknown_address(&self) -> bool {
        matches!(self, RpcError::Node { message, .. } if message.contains(NO_ADDRESS_INFO))
    }

    /// Sort a transport-level reqwest failure into a category.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return RpcError::Unreachable(ConnectFailure::Timeout);
        }
        if err.is_builder() {
            return RpcError::Setup(err.to_string());
        }

        let mut source: Option<&(dyn StdError + 'static)> = Some(&err);
        while let Some(e) = source {
            if let Some(io) = e.downcast_ref::<std::io::Error>() {
                match io.kind() {
                    std::io::ErrorKind::ConnectionRefused => {
                        return RpcError::Unreachable(ConnectFailure::Refused);
                    }
                    std::io::ErrorKind::TimedOut => {
                        return RpcError::Unreachable(ConnectFailure::Timeout);
                    }
                    _ => {}
                }
            }
            let text = e.to_string().to_ascii_lowercase();
            if text.contains("dns error") || text.contains("failed to lookup address") {
                return RpcError::Unreachable(ConnectFailure::Dns);
            }
            if text.contains("connection refused") {
                return RpcError::Unreachable(ConnectFailure::Refused);
            }
            source = e.source();
        }

        RpcError::Unreachable(ConnectFailure::Other(excerpt(&err.to_string())))
    }
}

/// Truncate `text` to [`MAX_BODY_EXCERPT`] characters.
pub(crate) fn excerpt(text: &str) -> String {
    text.chars().take(MAX_BODY_EXCERPT).collect()
}

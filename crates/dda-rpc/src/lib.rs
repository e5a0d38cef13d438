//! # dda-rpc
//! Stateless JSON-RPC 1.0 client for a btcd-style DDACOIN node.
//!
//! Every call is a single HTTP POST with optional Basic auth and a bounded
//! timeout. Failures are sorted into [`RpcError`] categories that each carry
//! a hint an operator can act on.

pub mod client;
pub mod error;
pub mod types;

pub use client::{RpcClient, RpcConfig, SearchOptions};
pub use error::{ConnectFailure, RpcError};
pub use types::{
    BlockHeaderInfo, BlockResponse, BlockSummary, ChainInfo, FullBlock, MiningInfo, PeerInfo,
    RawTransaction, ScriptPubKey, ScriptSig, TxInput, TxOutput, Verbosity,
};

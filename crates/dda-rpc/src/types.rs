//! Typed node responses.
//!
//! Field names follow the node's JSON exactly. Optional node fields default
//! rather than fail so that older or newer node versions still decode.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RpcError;

// ── Transactions ──────────────────────────────────────────────────────────────

/// Verbose transaction as returned by `getrawtransaction <txid> 1`,
/// `searchrawtransactions` and `getblock <hash> 2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub txid: String,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub version: i32,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub vsize: u64,
    #[serde(default)]
    pub locktime: u32,
    #[serde(default)]
    pub vin: Vec<TxInput>,
    #[serde(default)]
    pub vout: Vec<TxOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockhash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocktime: Option<i64>,
}

impl RawTransaction {
    pub fn is_coinbase(&self) -> bool {
        matches!(self.vin.first(), Some(TxInput::Coinbase { .. }))
    }

    /// Sum of all output values in coins, as the node reports them.
    pub fn total_out(&self) -> f64 {
        self.vout.iter().map(|o| o.value).sum()
    }
}

/// A transaction input: either the block reward marker or a spend of a
/// previous output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TxInput {
    Coinbase {
        coinbase: String,
        #[serde(default)]
        sequence: u32,
    },
    Spend {
        txid: String,
        vout: u32,
        #[serde(rename = "scriptSig", default, skip_serializing_if = "Option::is_none")]
        script_sig: Option<ScriptSig>,
        #[serde(default)]
        sequence: u32,
    },
}

impl TxInput {
    /// The outpoint this input spends, if it is not a coinbase.
    pub fn outpoint(&self) -> Option<(&str, u32)> {
        match self {
            TxInput::Coinbase { .. } => None,
            TxInput::Spend { txid, vout, .. } => Some((txid.as_str(), *vout)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptSig {
    #[serde(default)]
    pub asm: String,
    #[serde(default)]
    pub hex: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Value in whole coins (JSON number).
    pub value: f64,
    pub n: u32,
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: ScriptPubKey,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptPubKey {
    #[serde(default)]
    pub asm: String,
    #[serde(default)]
    pub hex: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ScriptPubKey {
    /// The address this output pays: the first of `addresses`, falling back
    /// to the single `address` field newer nodes emit.
    pub fn resolved_address(&self) -> Option<&str> {
        self.addresses
            .first()
            .map(String::as_str)
            .or(self.address.as_deref())
    }
}

// ── Blocks ────────────────────────────────────────────────────────────────────

/// `getblock` verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Serialized block hex.
    Raw = 0,
    /// Header fields and txids.
    Summary = 1,
    /// Header fields and decoded transactions.
    Full = 2,
}

/// Header fields common to verbose `getblock` responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockHeaderInfo {
    pub hash: String,
    #[serde(default)]
    pub confirmations: i64,
    #[serde(default)]
    pub size: u64,
    pub height: u64,
    #[serde(default)]
    pub version: i32,
    #[serde(default)]
    pub merkleroot: String,
    pub time: i64,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub bits: String,
    #[serde(default)]
    pub difficulty: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previousblockhash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nextblockhash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSummary {
    #[serde(flatten)]
    pub header: BlockHeaderInfo,
    #[serde(default)]
    pub tx: Vec<String>,
}

/// Block with decoded transactions. btcd returns them under `rawtx`; other
/// nodes use `tx`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullBlock {
    #[serde(flatten)]
    pub header: BlockHeaderInfo,
    #[serde(alias = "tx", default)]
    pub rawtx: Vec<RawTransaction>,
}

impl FullBlock {
    pub fn coinbase(&self) -> Option<&RawTransaction> {
        self.rawtx.first().filter(|tx| tx.is_coinbase())
    }
}

/// A `getblock` response, shaped by the verbosity it was requested with.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockResponse {
    Raw(String),
    Summary(BlockSummary),
    Full(FullBlock),
}

impl BlockResponse {
    /// Decode a `getblock` result for the verbosity it was requested with.
    pub fn decode(verbosity: Verbosity, value: Value) -> Result<Self, RpcError> {
        let invalid = |e: serde_json::Error| RpcError::InvalidResponse(e.to_string());
        Ok(match verbosity {
            Verbosity::Raw => BlockResponse::Raw(serde_json::from_value(value).map_err(invalid)?),
            Verbosity::Summary => {
                BlockResponse::Summary(serde_json::from_value(value).map_err(invalid)?)
            }
            Verbosity::Full => BlockResponse::Full(serde_json::from_value(value).map_err(invalid)?),
        })
    }

    pub fn header(&self) -> Option<&BlockHeaderInfo> {
        match self {
            BlockResponse::Raw(_) => None,
            BlockResponse::Summary(b) => Some(&b.header),
            BlockResponse::Full(b) => Some(&b.header),
        }
    }

    pub fn tx_count(&self) -> Option<usize> {
        match self {
            BlockResponse::Raw(_) => None,
            BlockResponse::Summary(b) => Some(b.tx.len()),
            BlockResponse::Full(b) => Some(b.rawtx.len()),
        }
    }
}

// ── Chain, mining, peers ──────────────────────────────────────────────────────

/// Verification progress at or above which the node counts as synced.
pub const SYNCED_PROGRESS: f64 = 0.9999;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainInfo {
    #[serde(default)]
    pub chain: String,
    pub blocks: u64,
    #[serde(default)]
    pub headers: u64,
    #[serde(default)]
    pub bestblockhash: String,
    #[serde(default)]
    pub difficulty: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mediantime: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verificationprogress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initialblockdownload: Option<bool>,
    #[serde(default)]
    pub pruned: bool,
}

impl ChainInfo {
    /// Verification progress in `[0, 1]`; nodes that omit it are treated as
    /// fully verified.
    pub fn progress(&self) -> f64 {
        self.verificationprogress.unwrap_or(1.0).clamp(0.0, 1.0)
    }

    pub fn is_synced(&self) -> bool {
        !self.initialblockdownload.unwrap_or(false) && self.progress() >= SYNCED_PROGRESS
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningInfo {
    #[serde(default)]
    pub blocks: u64,
    #[serde(default)]
    pub difficulty: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networkhashps: Option<f64>,
    #[serde(alias = "PooledTx", default)]
    pub pooledtx: u64,
    #[serde(default)]
    pub chain: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerInfo {
    #[serde(default)]
    pub id: i64,
    pub addr: String,
    #[serde(default)]
    pub subver: String,
    #[serde(default)]
    pub inbound: bool,
    #[serde(default)]
    pub startingheight: i64,
}

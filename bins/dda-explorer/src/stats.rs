//! Network health and daily issuance for the stats strip.

use chrono::{DateTime, NaiveTime, Utc};
use tracing::debug;

use dda_core::amount::coins_to_subunits;
use dda_rpc::{BlockResponse, ChainInfo, FullBlock, RpcClient, Verbosity};

/// Most blocks walked back from the tip when summing today's rewards.
pub const MAX_BLOCKS_SCANNED: u64 = 48;

/// `"Healthy"` or `"Syncing"` plus a display percentage.
pub fn health(info: &ChainInfo) -> (&'static str, String) {
    let label = if info.is_synced() { "Healthy" } else { "Syncing" };
    let pct = if info.progress() >= dda_rpc::types::SYNCED_PROGRESS {
        "100%".to_string()
    } else {
        format!("{:.1}%", info.progress() * 100.0)
    };
    (label, pct)
}

/// Unix timestamp of 00:00 UTC on the day containing `now`.
pub fn utc_midnight(now: DateTime<Utc>) -> i64 {
    now.date_naive().and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// Total coinbase output value of `block`, in subunits.
pub fn coinbase_reward(block: &FullBlock) -> u64 {
    block
        .coinbase()
        .map(|cb| {
            cb.vout
                .iter()
                .filter_map(|o| coins_to_subunits(o.value))
                .sum()
        })
        .unwrap_or(0)
}

/// Sum coinbase rewards of blocks mined at or after `since`, walking back
/// from `tip`. Stops at the first older block, after
/// [`MAX_BLOCKS_SCANNED`] blocks, or at the first RPC failure.
pub async fn mined_since(rpc: &RpcClient, tip: u64, since: i64) -> u64 {
    let mut total = 0u64;
    for height in (0..=tip).rev().take(MAX_BLOCKS_SCANNED as usize) {
        let block = match rpc.get_block_hash(height).await {
            Ok(hash) => rpc.get_block(&hash, Verbosity::Full).await,
            Err(e) => Err(e),
        };
        let block = match block {
            Ok(BlockResponse::Full(b)) => b,
            Ok(_) => break,
            Err(e) => {
                debug!(height, error = %e, "stopping issuance scan");
                break;
            }
        };
        if block.header.time < since {
            break;
        }
        total = total.saturating_add(coinbase_reward(&block));
    }
    total
}

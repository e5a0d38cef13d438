//! UTXO discovery from an address's transaction history.
//!
//! The history is whatever the node's address index returned for one
//! `searchrawtransactions` window; outputs beyond that window are invisible.

use std::collections::HashSet;

use serde::Serialize;

use dda_core::amount::coins_to_subunits;
use dda_rpc::RawTransaction;

/// An unspent output paying the wallet address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Utxo {
    pub txid: String,
    pub vout: u32,
    /// Value in subunits.
    pub value: u64,
    /// Locking script hex.
    pub script_pub_key: String,
}

impl Utxo {
    pub fn outpoint(&self) -> (&str, u32) {
        (&self.txid, self.vout)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSummary {
    /// Sum of `utxos` in subunits.
    pub balance: u64,
    /// Unspent outputs in discovery order.
    pub utxos: Vec<Utxo>,
}

/// Unspent outputs of `address` within `txs`.
///
/// Every spend input in the history marks its outpoint spent; outputs whose
/// resolved address equals `address` are kept unless spent. An absent or
/// empty history is a zero balance, not an error.
pub fn balance_from_txs(txs: Option<&[RawTransaction]>, address: &str) -> BalanceSummary {
    let Some(txs) = txs else {
        return BalanceSummary::default();
    };

    let spent: HashSet<(&str, u32)> = txs
        .iter()
        .flat_map(|tx| tx.vin.iter())
        .filter_map(|input| input.outpoint())
        .collect();

    let mut seen: HashSet<(&str, u32)> = HashSet::new();
    let mut utxos = Vec::new();
    for tx in txs {
        for out in &tx.vout {
            if out.script_pub_key.resolved_address() != Some(address) {
                continue;
            }
            let key = (tx.txid.as_str(), out.n);
            if spent.contains(&key) || !seen.insert(key) {
                continue;
            }
            let Some(value) = coins_to_subunits(out.value) else {
                continue;
            };
            utxos.push(Utxo {
                txid: tx.txid.clone(),
                vout: out.n,
                value,
                script_pub_key: out.script_pub_key.hex.clone(),
            });
        }
    }

    let balance = utxos.iter().fold(0u64, |acc, u| acc.saturating_add(u.value));
    BalanceSummary { balance, utxos }
}

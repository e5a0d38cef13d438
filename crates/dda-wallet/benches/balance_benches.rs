//! Criterion benchmarks for the balance engine and coin selection.
//!
//! Histories are synthetic: every transaction pays the wallet once and every
//! other transaction spends the previous payment.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

use dda_rpc::RawTransaction;
use dda_wallet::balance::balance_from_txs;
use dda_wallet::builder::select_inputs;

const ME: &str = "DBenchWalletAddress";

fn history(len: usize) -> Vec<RawTransaction> {
    (0..len)
        .map(|i| {
            let vin = if i % 2 == 1 {
                json!([{ "txid": format!("tx{}", i - 1), "vout": 0, "sequence": 0 }])
            } else {
                json!([{ "coinbase": "00", "sequence": 0 }])
            };
            serde_json::from_value(json!({
                "txid": format!("tx{i}"),
                "vin": vin,
                "vout": [
                    { "value": 0.5, "n": 0, "scriptPubKey": { "hex": "76a9", "addresses": [ME] } },
                    { "value": 1.25, "n": 1, "scriptPubKey": { "hex": "76a9", "addresses": ["DOther"] } }
                ]
            }))
            .unwrap()
        })
        .collect()
}

fn bench_balance_from_txs(c: &mut Criterion) {
    let txs = history(500);
    c.bench_function("balance_from_txs_500", |b| {
        b.iter(|| balance_from_txs(black_box(Some(txs.as_slice())), black_box(ME)))
    });
}

fn bench_select_inputs(c: &mut Criterion) {
    let summary = balance_from_txs(Some(history(500).as_slice()), ME);
    c.bench_function("select_inputs_all", |b| {
        b.iter(|| select_inputs(black_box(&summary.utxos), black_box(u64::MAX / 2)))
    });
}

criterion_group!(benches, bench_balance_from_txs, bench_select_inputs);
criterion_main!(benches);

//! Restore → balance → send → balance, against synthetic address history.

use std::collections::HashMap;

use async_trait::async_trait;
use bitcoin::absolute::LockTime;
use bitcoin::consensus::encode::serialize_hex;
use bitcoin::transaction::Version;
use bitcoin::{Amount, Transaction, TxIn, TxOut};
use serde_json::{Value, json};

use dda_core::amount::subunits_to_coins;
use dda_core::constants::COIN;
use dda_core::{Address, Network};
use dda_rpc::RawTransaction;
use dda_wallet::keys::derive_from_mnemonic;
use dda_wallet::{Credential, DerivedKey, PrevTxSource, TransactionBuilder, WalletError, balance_from_txs};

const PHRASE: &str = "legal winner thank year wave sausage worth useful legal winner thank yellow";

struct HexMap(HashMap<String, String>);

#[async_trait]
impl PrevTxSource for HexMap {
    async fn fetch_tx_hex(&self, txid: &str) -> Result<String, WalletError> {
        self.0.get(txid).cloned().ok_or_else(|| WalletError::PrevTxUnavailable {
            txid: txid.to_string(),
            reason: "unknown".into(),
        })
    }
}

/// Render a transaction the way `searchrawtransactions` reports it.
fn as_verbose(tx: &Transaction, network_addrs: &[(&Address, &str)]) -> RawTransaction {
    let vin: Vec<Value> = tx
        .input
        .iter()
        .map(|i| {
            if i.previous_output.is_null() {
                json!({ "coinbase": "00", "sequence": 0 })
            } else {
                json!({
                    "txid": i.previous_output.txid.to_string(),
                    "vout": i.previous_output.vout,
                    "sequence": i.sequence.0,
                })
            }
        })
        .collect();
    let vout: Vec<Value> = tx
        .output
        .iter()
        .enumerate()
        .map(|(n, o)| {
            let addr = network_addrs
                .iter()
                .find(|(a, _)| a.script_pubkey() == &o.script_pubkey)
                .map(|(_, s)| *s);
            json!({
                "value": subunits_to_coins(o.value.to_sat()),
                "n": n,
                "scriptPubKey": { "hex": o.script_pubkey.to_hex_string(), "addresses": addr.into_iter().collect::<Vec<_>>() }
            })
        })
        .collect();
    serde_json::from_value(json!({
        "txid": tx.compute_txid().to_string(),
        "vin": vin,
        "vout": vout,
    }))
    .unwrap()
}

#[tokio::test]
async fn restore_fund_send_and_rebalance() {
    let params = Network::Mainnet.params();
    let key = Credential::mnemonic(PHRASE).derive(params).unwrap();
    let again = derive_from_mnemonic(PHRASE, params, 0).unwrap();
    assert_eq!(key.address, again.address);

    let payee = DerivedKey::random(params).address;
    let me = key.address.as_str().to_string();
    let payee_str = payee.as_str().to_string();
    let labels = [(&key.address, me.as_str()), (&payee, payee_str.as_str())];

    let funding = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn::default()],
        output: vec![TxOut {
            value: Amount::from_sat(10 * COIN),
            script_pubkey: key.address.script_pubkey().clone(),
        }],
    };
    let mut history = vec![as_verbose(&funding, &labels)];
    let summary = balance_from_txs(Some(history.as_slice()), &me);
    assert_eq!(summary.balance, 10 * COIN);

    let source = HexMap(HashMap::from([(
        funding.compute_txid().to_string(),
        serialize_hex(&funding),
    )]));
    let mut builder = TransactionBuilder::new();
    builder.add_recipient(payee.clone(), 3 * COIN);
    let signed = builder
        .build_and_sign(&key, &summary.utxos, &source)
        .await
        .unwrap();
    assert_eq!(signed.input_count, 1);
    assert_eq!(signed.change, 7 * COIN - signed.fee);

    history.push(as_verbose(&signed.tx, &labels));
    let after = balance_from_txs(Some(history.as_slice()), &me);
    assert_eq!(after.balance, 7 * COIN - signed.fee);
    assert_eq!(after.utxos.len(), 1);
    assert_eq!(after.utxos[0].txid, signed.txid);

    let received = balance_from_txs(Some(history.as_slice()), &payee_str);
    assert_eq!(received.balance, 3 * COIN);
}

#[test]
fn testnet_recipient_does_not_parse_on_mainnet() {
    let testnet_addr = DerivedKey::random(Network::Testnet.params()).address;
    let err = Address::parse(testnet_addr.as_str(), Network::Mainnet.params()).unwrap_err();
    assert!(matches!(err, dda_core::AddressError::WrongVersion(0x6f, "mainnet")));
}

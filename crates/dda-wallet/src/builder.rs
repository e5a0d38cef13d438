//! Transaction builder with greedy coin selection and P2PKH signing.
//!
//! Building a payment:
//! 1. Select UTXOs in discovery order until they cover amount + margin
//! 2. Fetch each selected input's previous transaction and check it
//! 3. Estimate the fee, add the recipient and (non-dust) change outputs
//! 4. Sign every input with legacy SIGHASH_ALL
//!
//! Nothing here broadcasts; the caller sends the returned hex.

use std::str::FromStr;

use async_trait::async_trait;
use bitcoin::absolute::LockTime;
use bitcoin::consensus::{deserialize, encode::serialize_hex};
use bitcoin::ecdsa;
use bitcoin::hashes::Hash;
use bitcoin::script::{Builder, PushBytesBuf};
use bitcoin::secp256k1::{Message, Secp256k1};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use tracing::debug;

use dda_core::Address;
use dda_core::constants::{
    DEFAULT_FEE_PER_KB, DUST_THRESHOLD, EST_INPUT_SIZE, EST_OUTPUT_SIZE, EST_TX_OVERHEAD,
    SELECTION_MARGIN,
};
use dda_rpc::RpcClient;

use crate::balance::Utxo;
use crate::error::WalletError;
use crate::keys::DerivedKey;

/// Supplies serialized previous transactions for the inputs being signed.
#[async_trait]
pub trait PrevTxSource: Send + Sync {
    /// Hex of the full serialized transaction `txid`.
    async fn fetch_tx_hex(&self, txid: &str) -> Result<String, WalletError>;
}

#[async_trait]
impl PrevTxSource for RpcClient {
    async fn fetch_tx_hex(&self, txid: &str) -> Result<String, WalletError> {
        self.get_raw_transaction_hex(txid)
            .await
            .map_err(|e| WalletError::PrevTxUnavailable {
                txid: txid.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Fee for a transaction of the estimated size, charged per started kilobyte.
///
/// ```
/// use dda_wallet::builder::estimate_fee;
/// assert_eq!(estimate_fee(1, 1, 1000), 1000);
/// assert_eq!(estimate_fee(7, 1, 1000), 2000);
/// ```
pub fn estimate_fee(inputs: usize, outputs: usize, fee_per_kb: u64) -> u64 {
    let size = inputs as u64 * EST_INPUT_SIZE + outputs as u64 * EST_OUTPUT_SIZE + EST_TX_OVERHEAD;
    size.div_ceil(1000) * fee_per_kb
}

/// Take UTXOs in order until they reach `amount` + [`SELECTION_MARGIN`] or
/// the list runs out. Returns the selection and its total value.
pub fn select_inputs(utxos: &[Utxo], amount: u64) -> (Vec<&Utxo>, u64) {
    let target = amount.saturating_add(SELECTION_MARGIN);
    let mut selected = Vec::new();
    let mut total: u64 = 0;
    for utxo in utxos {
        if total >= target {
            break;
        }
        total = total.saturating_add(utxo.value);
        selected.push(utxo);
    }
    (selected, total)
}

/// A signed transaction ready for `sendrawtransaction`.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub tx: Transaction,
    pub hex: String,
    pub txid: String,
    pub fee: u64,
    /// Change paid back, zero when no change output exists.
    pub change: u64,
    pub input_count: usize,
}

/// Builder for one payment from a single-key wallet.
///
/// # Example
/// ```ignore
/// let signed = TransactionBuilder::new()
///     .add_recipient(to, amount)
///     .set_change_address(key.address.clone())
///     .build_and_sign(&key, &utxos, &rpc)
///     .await?;
/// ```
pub struct TransactionBuilder {
    recipient: Option<(Address, u64)>,
    change_address: Option<Address>,
    fee_per_kb: u64,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self {
            recipient: None,
            change_address: None,
            fee_per_kb: DEFAULT_FEE_PER_KB,
        }
    }

    /// Set the single recipient.
    pub fn add_recipient(&mut self, address: Address, amount: u64) -> &mut Self {
        self.recipient = Some((address, amount));
        self
    }

    /// Where change goes (default: the signing key's own address).
    pub fn set_change_address(&mut self, address: Address) -> &mut Self {
        self.change_address = Some(address);
        self
    }

    /// Override the fee rate (default: [`DEFAULT_FEE_PER_KB`]).
    pub fn set_fee_per_kb(&mut self, fee_per_kb: u64) -> &mut Self {
        self.fee_per_kb = fee_per_kb;
        self
    }

    /// Select, fetch, build and sign. `utxos` must be in discovery order and
    /// all locked to `key`'s address.
    pub async fn build_and_sign(
        &self,
        key: &DerivedKey,
        utxos: &[Utxo],
        source: &dyn PrevTxSource,
    ) -> Result<SignedTransaction, WalletError> {
        let (recipient, amount) = self
            .recipient
            .as_ref()
            .ok_or_else(|| WalletError::Signing("no recipient".into()))?;
        if *amount == 0 {
            return Err(WalletError::ZeroAmount);
        }
        let change_address = self.change_address.as_ref().unwrap_or(&key.address);

        let (selected, total_in) = select_inputs(utxos, *amount);
        if total_in < *amount {
            return Err(WalletError::InsufficientFunds {
                have: total_in,
                need: *amount,
            });
        }

        let mut inputs = Vec::with_capacity(selected.len());
        let mut prev_scripts = Vec::with_capacity(selected.len());
        for utxo in &selected {
            let (outpoint, prev_out) = fetch_prev_output(utxo, source).await?;
            inputs.push(TxIn {
                previous_output: outpoint,
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::default(),
            });
            prev_scripts.push(prev_out.script_pubkey);
        }

        let fee = estimate_fee(inputs.len(), 1, self.fee_per_kb);
        let need = amount.saturating_add(fee);
        let change = total_in.checked_sub(need).ok_or(WalletError::InsufficientFunds {
            have: total_in,
            need,
        })?;

        let mut outputs = vec![TxOut {
            value: Amount::from_sat(*amount),
            script_pubkey: recipient.script_pubkey().clone(),
        }];
        if change > DUST_THRESHOLD {
            outputs.push(TxOut {
                value: Amount::from_sat(change),
                script_pubkey: change_address.script_pubkey().clone(),
            });
        } else if change > 0 {
            return Err(WalletError::DustChange { change });
        }

        let mut tx = Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: inputs,
            output: outputs,
        };
        sign_inputs(&mut tx, &prev_scripts, key)?;

        let txid = tx.compute_txid().to_string();
        debug!(%txid, inputs = tx.input.len(), fee, change, "signed transaction");
        Ok(SignedTransaction {
            hex: serialize_hex(&tx),
            txid,
            fee,
            change,
            input_count: tx.input.len(),
            tx,
        })
    }
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetch and check the previous output a UTXO refers to.
async fn fetch_prev_output(
    utxo: &Utxo,
    source: &dyn PrevTxSource,
) -> Result<(OutPoint, TxOut), WalletError> {
    let txid = Txid::from_str(&utxo.txid)
        .map_err(|e| WalletError::PrevTxMismatch(format!("bad txid {}: {e}", utxo.txid)))?;
    let hex_tx = source.fetch_tx_hex(&utxo.txid).await?;
    let bytes = hex::decode(hex_tx.trim()).map_err(|e| WalletError::PrevTxUnavailable {
        txid: utxo.txid.clone(),
        reason: format!("invalid hex: {e}"),
    })?;
    let prev: Transaction = deserialize(&bytes).map_err(|e| WalletError::PrevTxUnavailable {
        txid: utxo.txid.clone(),
        reason: format!("undecodable transaction: {e}"),
    })?;

    if prev.compute_txid() != txid {
        return Err(WalletError::PrevTxMismatch(format!(
            "node returned {} for {}",
            prev.compute_txid(),
            utxo.txid
        )));
    }
    let out = prev.output.get(utxo.vout as usize).cloned().ok_or_else(|| {
        WalletError::PrevTxMismatch(format!("{} has no output {}", utxo.txid, utxo.vout))
    })?;
    if out.value.to_sat() != utxo.value {
        return Err(WalletError::PrevTxMismatch(format!(
            "{}:{} holds {} subunits, history says {}",
            utxo.txid,
            utxo.vout,
            out.value.to_sat(),
            utxo.value
        )));
    }
    Ok((OutPoint::new(txid, utxo.vout), out))
}

/// Sign every input with SIGHASH_ALL over its previous output script and set
/// the scriptSig to `<sig> <pubkey>`.
fn sign_inputs(
    tx: &mut Transaction,
    prev_scripts: &[ScriptBuf],
    key: &DerivedKey,
) -> Result<(), WalletError> {
    let secp = Secp256k1::signing_only();
    let own_script = key.address.script_pubkey();

    let mut script_sigs = Vec::with_capacity(prev_scripts.len());
    {
        let cache = SighashCache::new(&*tx);
        for (i, script) in prev_scripts.iter().enumerate() {
            if script != own_script {
                return Err(WalletError::Signing(format!(
                    "input {i} is not locked to {}",
                    key.address
                )));
            }
            let sighash = cache
                .legacy_signature_hash(i, script, EcdsaSighashType::All.to_u32())
                .map_err(|e| WalletError::Signing(e.to_string()))?;
            let msg = Message::from_digest(sighash.to_byte_array());
            let signature = ecdsa::Signature {
                signature: secp.sign_ecdsa(&msg, &key.private_key.inner),
                sighash_type: EcdsaSighashType::All,
            };
            let push = PushBytesBuf::try_from(signature.to_vec())
                .map_err(|e| WalletError::Signing(e.to_string()))?;
            script_sigs.push(
                Builder::new()
                    .push_slice(&push)
                    .push_key(&key.public_key)
                    .into_script(),
            );
        }
    }

    for (input, script_sig) in tx.input.iter_mut().zip(script_sigs) {
        input.script_sig = script_sig;
    }
    Ok(())
}

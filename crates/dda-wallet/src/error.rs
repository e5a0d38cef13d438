//! Wallet error types.

use dda_core::{AddressError, AmountError};
use thiserror::Error;

/// Errors that can occur in wallet operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Phrase failed wordlist or checksum validation.
    #[error("Invalid mnemonic phrase: {0}")]
    InvalidMnemonic(String),

    /// WIF string failed to decode.
    #[error("Invalid WIF: bad checksum or format. Check for typos.")]
    InvalidKeyFormat,

    /// BIP-32 derivation produced no usable private key.
    #[error("key derivation: {0}")]
    KeyDerivation(String),

    /// Address does not belong to the active network.
    #[error("Invalid address for active network. {hint}")]
    InvalidAddress {
        /// Underlying parse failure.
        reason: AddressError,
        /// Which addresses the active network accepts.
        hint: String,
    },

    /// Amount string could not be parsed.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Amount is zero.
    #[error("Amount must be positive")]
    ZeroAmount,

    /// Selected inputs do not cover the amount (plus fee, once known).
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientFunds {
        /// Value of the selected inputs in subunits.
        have: u64,
        /// Required amount in subunits.
        need: u64,
    },

    /// Change would be positive but not above the dust threshold.
    #[error("Dust change ({change} subunits); try sending a bit less")]
    DustChange {
        /// The change value that was refused.
        change: u64,
    },

    /// Previous transaction could not be fetched.
    #[error("Could not fetch previous tx {txid}: {reason}")]
    PrevTxUnavailable { txid: String, reason: String },

    /// Previous transaction does not match the UTXO it should fund.
    #[error("previous tx mismatch: {0}")]
    PrevTxMismatch(String),

    /// Signing or serialization failure.
    #[error("signing: {0}")]
    Signing(String),
}

//! # dda-wallet — key handling and transaction construction for the web wallet.
//!
//! The wallet keeps no state of its own: balances are recomputed from the
//! node's address history on every request and keys live only inside an
//! in-memory session.
//!
//! # Modules
//!
//! - [`error`] — `WalletError` enum
//! - [`mnemonic`] — BIP-39 phrase generation, normalization, validation
//! - [`keys`] — BIP-44 / WIF key derivation and session credentials
//! - [`balance`] — UTXO discovery from address history
//! - [`builder`] — Coin selection, fee estimation and P2PKH signing
//! - [`session`] — Token-keyed session store with TTL

pub mod balance;
pub mod builder;
pub mod error;
pub mod keys;
pub mod mnemonic;
pub mod session;

// Re-exports for convenient access
pub use balance::{BalanceSummary, Utxo, balance_from_txs};
pub use builder::{PrevTxSource, SignedTransaction, TransactionBuilder};
pub use error::WalletError;
pub use keys::{Credential, DerivedKey};
pub use session::{InMemorySessionStore, Session, SessionStore};

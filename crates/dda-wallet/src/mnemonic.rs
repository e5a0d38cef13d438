//! BIP-39 recovery phrases.

use bip39::{Language, Mnemonic};
use rand::RngCore;
use zeroize::Zeroize;

use crate::error::WalletError;

/// Entropy behind a generated phrase: 128 bits, 12 words.
const ENTROPY_BYTES: usize = 16;

/// Generate a fresh 12-word English phrase from OS randomness.
pub fn generate_mnemonic() -> Result<String, WalletError> {
    let mut entropy = [0u8; ENTROPY_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut entropy);
    let result = Mnemonic::from_entropy_in(Language::English, &entropy)
        .map(|m| m.to_string())
        .map_err(|e| WalletError::KeyDerivation(e.to_string()));
    entropy.zeroize();
    result
}

/// Trim, lowercase and collapse whitespace runs to single spaces.
pub fn normalize_mnemonic(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Parse a phrase after normalization, checking wordlist and checksum.
pub fn parse_mnemonic(phrase: &str) -> Result<Mnemonic, WalletError> {
    let normalized = normalize_mnemonic(phrase);
    Mnemonic::parse_in_normalized(Language::English, &normalized)
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))
}

pub fn validate_mnemonic(phrase: &str) -> bool {
    parse_mnemonic(phrase).is_ok()
}

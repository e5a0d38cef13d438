//! Key derivation from recovery phrases and imported WIF keys.
//!
//! Phrases follow BIP-39 → BIP-32 → BIP-44 (`m/44'/coin'/0'/0/i`) and always
//! yield a compressed key. Imported WIF keys keep the compression flag they
//! were encoded with. In both cases the address is a legacy P2PKH address
//! under the active network's version byte, whatever network the WIF came
//! from.

use std::fmt;

use bitcoin::bip32::{ChildNumber, DerivationPath, Xpriv};
use bitcoin::secp256k1::{Secp256k1, SecretKey};
use bitcoin::{NetworkKind, PrivateKey, PublicKey};
use rand::RngCore;
use zeroize::Zeroize;

use dda_core::{Address, NetworkParams};

use crate::error::WalletError;
use crate::mnemonic::{normalize_mnemonic, parse_mnemonic};

/// Secret material a session holds. Zeroized on drop.
pub enum Credential {
    /// Normalized BIP-39 phrase.
    Mnemonic(String),
    /// Trimmed WIF string.
    Wif(String),
}

impl Credential {
    pub fn mnemonic(phrase: &str) -> Self {
        Credential::Mnemonic(normalize_mnemonic(phrase))
    }

    pub fn wif(wif: &str) -> Self {
        Credential::Wif(wif.trim().to_string())
    }

    /// Derive the signing key (external index 0 for phrases).
    pub fn derive(&self, params: &NetworkParams) -> Result<DerivedKey, WalletError> {
        match self {
            Credential::Mnemonic(phrase) => derive_from_mnemonic(phrase, params, 0),
            Credential::Wif(wif) => derive_from_wif(wif, params),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Credential::Mnemonic(_) => "mnemonic",
            Credential::Wif(_) => "wif",
        }
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        match self {
            Credential::Mnemonic(s) | Credential::Wif(s) => s.zeroize(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential")
            .field(&self.kind())
            .field(&"[REDACTED]")
            .finish()
    }
}

/// A signing key and the address it controls on the active network.
#[derive(Clone)]
pub struct DerivedKey {
    pub private_key: PrivateKey,
    pub public_key: PublicKey,
    pub address: Address,
    /// BIP-44 path, for phrase-derived keys.
    pub path: Option<String>,
}

impl DerivedKey {
    fn from_private(private_key: PrivateKey, params: &NetworkParams, path: Option<String>) -> Self {
        let secp = Secp256k1::signing_only();
        let public_key = private_key.public_key(&secp);
        let address = Address::p2pkh(&public_key, params);
        Self {
            private_key,
            public_key,
            address,
            path,
        }
    }

    /// A fresh random compressed key.
    pub fn random(params: &NetworkParams) -> Self {
        let mut bytes = [0u8; 32];
        let secret = loop {
            rand::rngs::OsRng.fill_bytes(&mut bytes);
            if let Ok(secret) = SecretKey::from_slice(&bytes) {
                break secret;
            }
        };
        bytes.zeroize();
        Self::from_private(PrivateKey::new(secret, NetworkKind::Main), params, None)
    }

    /// WIF encoding under the active network's version byte.
    pub fn to_wif(&self, params: &NetworkParams) -> String {
        encode_wif(&self.private_key, params)
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("private_key", &"[REDACTED]")
            .field("public_key", &self.public_key)
            .field("address", &self.address.as_str())
            .field("path", &self.path)
            .finish()
    }
}

/// Derive the key at external `index` of account 0 from a phrase.
pub fn derive_from_mnemonic(
    phrase: &str,
    params: &NetworkParams,
    index: u32,
) -> Result<DerivedKey, WalletError> {
    let mnemonic = parse_mnemonic(phrase)?;
    let mut seed = mnemonic.to_seed("");
    let secp = Secp256k1::new();
    let derived = (|| {
        let master = Xpriv::new_master(NetworkKind::Main, &seed)?;
        let path = DerivationPath::from(vec![
            ChildNumber::from_hardened_idx(44)?,
            ChildNumber::from_hardened_idx(params.coin_type)?,
            ChildNumber::from_hardened_idx(0)?,
            ChildNumber::from_normal_idx(0)?,
            ChildNumber::from_normal_idx(index)?,
        ]);
        master.derive_priv(&secp, &path)
    })();
    seed.zeroize();

    let child = derived.map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
    let private_key = PrivateKey::new(child.private_key, NetworkKind::Main);
    Ok(DerivedKey::from_private(
        private_key,
        params,
        Some(params.bip44_path(index)),
    ))
}

/// Decode a WIF key. Accepts the active network's WIF byte plus the DDACOIN
/// mainnet, Bitcoin mainnet and shared testnet bytes.
pub fn derive_from_wif(wif: &str, params: &NetworkParams) -> Result<DerivedKey, WalletError> {
    let mut data = bs58::decode(wif.trim())
        .with_check(None)
        .into_vec()
        .map_err(|_| WalletError::InvalidKeyFormat)?;
    let decoded = decode_wif_payload(&data, params);
    data.zeroize();
    let private_key = decoded?;
    Ok(DerivedKey::from_private(private_key, params, None))
}

fn decode_wif_payload(data: &[u8], params: &NetworkParams) -> Result<PrivateKey, WalletError> {
    let (&version, payload) = data.split_first().ok_or(WalletError::InvalidKeyFormat)?;
    if !params.accepts_wif_version(version) {
        return Err(WalletError::InvalidKeyFormat);
    }
    let compressed = match (payload.len(), payload.last()) {
        (32, _) => false,
        (33, Some(0x01)) => true,
        _ => return Err(WalletError::InvalidKeyFormat),
    };
    let inner =
        SecretKey::from_slice(&payload[..32]).map_err(|_| WalletError::InvalidKeyFormat)?;
    Ok(PrivateKey {
        compressed,
        network: NetworkKind::Main,
        inner,
    })
}

/// Encode `key` as WIF with the active network's version byte.
pub fn encode_wif(key: &PrivateKey, params: &NetworkParams) -> String {
    let mut payload = Vec::with_capacity(34);
    payload.push(params.wif);
    payload.extend_from_slice(&key.inner.secret_bytes());
    if key.compressed {
        payload.push(0x01);
    }
    let encoded = bs58::encode(&payload).with_check().into_string();
    payload.zeroize();
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use dda_core::Network;

    const PHRASE: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn wif_with(version: u8, secret: [u8; 32], compressed: bool) -> String {
        let mut payload = vec![version];
        payload.extend_from_slice(&secret);
        if compressed {
            payload.push(0x01);
        }
        bs58::encode(payload).with_check().into_string()
    }

    #[test]
    fn same_phrase_same_key() {
        let params = Network::Mainnet.params();
        let a = derive_from_mnemonic(PHRASE, params, 0).unwrap();
        let b = derive_from_mnemonic(&PHRASE.to_uppercase(), params, 0).unwrap();
        assert_eq!(a.address, b.address);
        assert_eq!(a.private_key, b.private_key);
        assert!(a.public_key.compressed);
        assert!(a.address.as_str().starts_with('D'));
        assert_eq!(a.path.as_deref(), Some("m/44'/56748'/0'/0/0"));
    }

    #[test]
    fn index_changes_key() {
        let params = Network::Mainnet.params();
        let a = derive_from_mnemonic(PHRASE, params, 0).unwrap();
        let b = derive_from_mnemonic(PHRASE, params, 1).unwrap();
        assert_ne!(a.address, b.address);
    }

    #[test]
    fn testnet_uses_own_coin_type_and_version() {
        let main = derive_from_mnemonic(PHRASE, Network::Mainnet.params(), 0).unwrap();
        let test = derive_from_mnemonic(PHRASE, Network::Testnet.params(), 0).unwrap();
        assert_ne!(main.private_key, test.private_key);
        assert!(dda_core::address::is_valid_for_network(
            test.address.as_str(),
            Network::Testnet.params()
        ));
    }

    #[test]
    fn bad_phrase_rejected() {
        let err = derive_from_mnemonic("hello world", Network::Mainnet.params(), 0).unwrap_err();
        assert!(matches!(err, WalletError::InvalidMnemonic(_)));
    }

    #[test]
    fn wif_roundtrip_preserves_key() {
        let params = Network::Mainnet.params();
        let key = DerivedKey::random(params);
        let wif = key.to_wif(params);
        let restored = derive_from_wif(&wif, params).unwrap();
        assert_eq!(restored.private_key, key.private_key);
        assert_eq!(restored.address, key.address);
    }

    #[test]
    fn foreign_wif_versions_map_to_active_address() {
        let params = Network::Mainnet.params();
        let secret = [0x11; 32];
        let own = derive_from_wif(&wif_with(0xbd, secret, true), params).unwrap();
        let btc = derive_from_wif(&wif_with(0x80, secret, true), params).unwrap();
        let test = derive_from_wif(&wif_with(0xef, secret, true), params).unwrap();
        assert_eq!(own.address, btc.address);
        assert_eq!(own.address, test.address);
        assert!(own.address.as_str().starts_with('D'));
    }

    #[test]
    fn uncompressed_wif_gives_uncompressed_address() {
        let params = Network::Mainnet.params();
        let secret = [0x22; 32];
        let c = derive_from_wif(&wif_with(0xbd, secret, true), params).unwrap();
        let u = derive_from_wif(&wif_with(0xbd, secret, false), params).unwrap();
        assert!(!u.public_key.compressed);
        assert_ne!(c.address, u.address);
    }

    #[test]
    fn bad_wif_rejected() {
        let params = Network::Mainnet.params();
        let mut wif = wif_with(0xbd, [0x33; 32], true);
        let last = wif.pop().unwrap();
        wif.push(if last == 'z' { 'y' } else { 'z' });
        assert_eq!(derive_from_wif(&wif, params).unwrap_err(), WalletError::InvalidKeyFormat);
        assert_eq!(
            derive_from_wif(&wif_with(0x01, [0x33; 32], true), params).unwrap_err(),
            WalletError::InvalidKeyFormat
        );
        assert_eq!(
            derive_from_wif(&wif_with(0xbd, [0x00; 32], true), params).unwrap_err(),
            WalletError::InvalidKeyFormat
        );
        assert_eq!(derive_from_wif("", params).unwrap_err(), WalletError::InvalidKeyFormat);
    }

    #[test]
    fn credential_debug_is_redacted() {
        let cred = Credential::mnemonic(PHRASE);
        let shown = format!("{cred:?}");
        assert!(!shown.contains("abandon"));
        assert!(shown.contains("REDACTED"));
    }

    #[test]
    fn credential_derives_same_as_direct() {
        let params = Network::Mainnet.params();
        let cred = Credential::mnemonic(&format!("  {PHRASE} "));
        let key = cred.derive(params).unwrap();
        assert_eq!(key.address, derive_from_mnemonic(PHRASE, params, 0).unwrap().address);
    }
}

//! Address parsing and encoding for the DDACOIN networks.
//!
//! Two encodings are accepted:
//! - Legacy base58check with the network's P2PKH or P2SH version byte
//!   (mainnet P2PKH addresses start with `D`).
//! - Segwit bech32/bech32m with the network's human-readable prefix
//!   (`dda1...` / `tdda1...`).
//!
//! An address is only ever valid relative to one [`NetworkParams`] set; the
//! same string is rejected when a different set is active.

use bitcoin::bech32;
use bitcoin::hashes::Hash;
use bitcoin::{PubkeyHash, PublicKey, ScriptBuf, ScriptHash, WitnessProgram, WitnessVersion};
use std::fmt;

use crate::error::AddressError;
use crate::network::NetworkParams;

/// Length of a base58check payload: version byte + 20-byte hash.
const LEGACY_PAYLOAD_LEN: usize = 21;

/// The output type an address locks funds to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressKind {
    P2pkh,
    P2sh,
    Segwit { version: u8 },
}

/// A parsed address together with the locking script it stands for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Address {
    kind: AddressKind,
    script_pubkey: ScriptBuf,
    encoded: String,
}

impl Address {
    /// Parse `s` as an address of the given network.
    pub fn parse(s: &str, params: &NetworkParams) -> Result<Self, AddressError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AddressError::Empty);
        }

        if let Ok((hrp, version, program)) = bech32::segwit::decode(s) {
            let found = hrp.to_lowercase();
            if found != params.bech32_hrp {
                return Err(AddressError::WrongHrp {
                    found,
                    expected: params.bech32_hrp,
                    network: params.name(),
                });
            }
            let version = version.to_u8();
            let witness_version = WitnessVersion::try_from(version)
                .map_err(|e| AddressError::InvalidWitnessProgram(e.to_string()))?;
            let witness_program = WitnessProgram::new(witness_version, &program)
                .map_err(|e| AddressError::InvalidWitnessProgram(e.to_string()))?;
            return Ok(Self {
                kind: AddressKind::Segwit { version },
                script_pubkey: ScriptBuf::new_witness_program(&witness_program),
                encoded: s.to_string(),
            });
        }

        let payload = bs58::decode(s)
            .with_check(None)
            .into_vec()
            .map_err(|_| AddressError::Encoding)?;
        if payload.len() != LEGACY_PAYLOAD_LEN {
            return Err(AddressError::InvalidLength(payload.len()));
        }
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&payload[1..]);

        let (kind, script_pubkey) = match payload[0] {
            v if v == params.pubkey_hash => (
                AddressKind::P2pkh,
                ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array(hash)),
            ),
            v if v == params.script_hash => (
                AddressKind::P2sh,
                ScriptBuf::new_p2sh(&ScriptHash::from_byte_array(hash)),
            ),
            v => return Err(AddressError::WrongVersion(v, params.name())),
        };

        Ok(Self {
            kind,
            script_pubkey,
            encoded: s.to_string(),
        })
    }

    /// Legacy P2PKH address for a 20-byte pubkey hash.
    pub fn from_pubkey_hash(hash: PubkeyHash, params: &NetworkParams) -> Self {
        let mut payload = Vec::with_capacity(LEGACY_PAYLOAD_LEN);
        payload.push(params.pubkey_hash);
        payload.extend_from_slice(hash.as_byte_array());
        Self {
            kind: AddressKind::P2pkh,
            script_pubkey: ScriptBuf::new_p2pkh(&hash),
            encoded: bs58::encode(payload).with_check().into_string(),
        }
    }

    /// Legacy P2PKH address for a public key (hash of its serialized form,
    /// compressed or not as the key says).
    pub fn p2pkh(public_key: &PublicKey, params: &NetworkParams) -> Self {
        Self::from_pubkey_hash(public_key.pubkey_hash(), params)
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    /// Locking script for outputs paying to this address.
    pub fn script_pubkey(&self) -> &ScriptBuf {
        &self.script_pubkey
    }

    pub fn as_str(&self) -> &str {
        &self.encoded
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

/// Whether `s` is a valid address for the given network.
pub fn is_valid_for_network(s: &str, params: &NetworkParams) -> bool {
    Address::parse(s, params).is_ok()
}

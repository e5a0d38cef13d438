//! Chain parameters for the DDACOIN networks.
//!
//! Exactly one [`NetworkParams`] set is active per process. Binaries pick it
//! once at startup (from `DDACOIN_NETWORK`) and pass the `&'static` reference
//! into every derivation, validation and build call; nothing below the
//! binaries reads process state to decide which network is in use.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// WIF version bytes accepted on import in addition to the active network's
/// own byte: DDACOIN mainnet, Bitcoin mainnet and the shared testnet byte.
pub const FOREIGN_WIF_VERSIONS: [u8; 3] = [0xbd, 0x80, 0xef];

/// Network selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Production network (P2PKH addresses start with `D`).
    #[default]
    Mainnet,
    /// Public test network.
    Testnet,
}

impl Network {
    /// Static parameter set for this network.
    pub fn params(self) -> &'static NetworkParams {
        match self {
            Network::Mainnet => &MAINNET,
            Network::Testnet => &TESTNET,
        }
    }

    /// Lowercase name (`mainnet` / `testnet`).
    pub fn name(self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }

    /// Resolve the `DDACOIN_NETWORK` setting: `testnet` selects testnet,
    /// anything else (including unset) selects mainnet.
    ///
    /// ```
    /// use dda_core::Network;
    /// assert_eq!(Network::from_setting(Some("testnet")), Network::Testnet);
    /// assert_eq!(Network::from_setting(Some("bogus")), Network::Mainnet);
    /// assert_eq!(Network::from_setting(None), Network::Mainnet);
    /// ```
    pub fn from_setting(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("testnet") => Network::Testnet,
            _ => Network::Mainnet,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            other => Err(CoreError::UnknownNetwork(other.to_string())),
        }
    }
}

/// BIP32 extended key version bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bip32Versions {
    pub public: u32,
    pub private: u32,
}

/// Static descriptor of one chain variant.
#[derive(Debug, PartialEq, Eq)]
pub struct NetworkParams {
    pub network: Network,
    /// Display name of the coin on this network.
    pub coin_name: &'static str,
    /// Base58 version byte of P2PKH addresses.
    pub pubkey_hash: u8,
    /// Base58 version byte of P2SH addresses.
    pub script_hash: u8,
    /// Version byte of Wallet Import Format private keys.
    pub wif: u8,
    pub bip32: Bip32Versions,
    /// Bech32 human-readable prefix for segwit addresses.
    pub bech32_hrp: &'static str,
    pub message_prefix: &'static str,
    /// BIP44 coin type used in `m/44'/coin'/0'/0/i`.
    pub coin_type: u32,
    pub default_rpc_port: u16,
    pub default_p2p_port: u16,
    /// Scheme of payment URIs (`ddacoin:<address>`).
    pub uri_scheme: &'static str,
}

pub static MAINNET: NetworkParams = NetworkParams {
    network: Network::Mainnet,
    coin_name: "DDACOIN",
    pubkey_hash: 0x1e,
    script_hash: 0x7d,
    wif: 0xbd,
    bip32: Bip32Versions {
        public: 0x0488_b21f,
        private: 0x0488_ade5,
    },
    bech32_hrp: "dda",
    message_prefix: "\x18DDACOIN Signed Message:\n",
    coin_type: 0xddac,
    default_rpc_port: 9667,
    default_p2p_port: 9666,
    uri_scheme: "ddacoin",
};

pub static TESTNET: NetworkParams = NetworkParams {
    network: Network::Testnet,
    coin_name: "DDACOIN TESTNET",
    pubkey_hash: 0x6f,
    script_hash: 0xc4,
    wif: 0xef,
    bip32: Bip32Versions {
        public: 0x0435_87cf,
        private: 0x0435_8394,
    },
    bech32_hrp: "tdda",
    message_prefix: "\x18DDACOIN Signed Message:\n",
    coin_type: 1,
    default_rpc_port: 19667,
    default_p2p_port: 19666,
    uri_scheme: "ddacoin",
};

impl NetworkParams {
    /// Lowercase network name.
    pub fn name(&self) -> &'static str {
        self.network.name()
    }

    /// Whether a decoded WIF version byte may be imported on this network.
    pub fn accepts_wif_version(&self, version: u8) -> bool {
        version == self.wif || FOREIGN_WIF_VERSIONS.contains(&version)
    }

    /// Display form of the BIP44 path for external address `index`.
    ///
    /// ```
    /// use dda_core::Network;
    /// assert_eq!(Network::Mainnet.params().bip44_path(0), "m/44'/56748'/0'/0/0");
    /// ```
    pub fn bip44_path(&self, index: u32) -> String {
        format!("m/44'/{}'/0'/0/{index}", self.coin_type)
    }

    /// Human hint describing which addresses this network accepts.
    pub fn address_hint(&self) -> String {
        match self.network {
            Network::Mainnet => format!(
                "Expected {} mainnet address (legacy D or bech32 {}1...).",
                MAINNET.coin_name, self.bech32_hrp
            ),
            Network::Testnet => format!(
                "Expected {} testnet address (legacy m/n/2 or bech32 {}1...).",
                MAINNET.coin_name, self.bech32_hrp
            ),
        }
    }
}

//! Error types for network, address and amount handling.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown network: {0}")]
    UnknownNetwork(String),
}

/// Why a string is not an address of the active network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("empty address")]
    Empty,
    #[error("not a valid base58check or bech32 address")]
    Encoding,
    #[error("invalid payload length: {0}")]
    InvalidLength(usize),
    /// Base58 version byte and the network it was checked against.
    #[error("address version 0x{0:02x} does not belong to the {1} network")]
    WrongVersion(u8, &'static str),
    #[error("address prefix {found} does not belong to the {network} network (expected {expected})")]
    WrongHrp {
        found: String,
        expected: &'static str,
        network: &'static str,
    },
    #[error("invalid witness program: {0}")]
    InvalidWitnessProgram(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("empty amount")]
    Empty,
    #[error("invalid amount: {0}")]
    Invalid(String),
    #[error("amount must not be negative")]
    Negative,
    #[error("too many decimal places (max {0})")]
    TooManyDecimals(u32),
    #[error("amount overflow")]
    Overflow,
}

//! Wallet constants. All monetary values in subunits (1 DDACOIN = 10^8 subunits).

/// Number of decimal places in one coin.
pub const DECIMALS: u32 = 8;

/// Subunits per whole coin.
pub const COIN: u64 = 100_000_000;

/// Default fee rate in subunits per kilobyte of estimated transaction size.
pub const DEFAULT_FEE_PER_KB: u64 = 1_000;

/// Change at or below this value is refused rather than created.
pub const DUST_THRESHOLD: u64 = 546;

/// Extra value gathered on top of the send amount during coin selection so
/// the fee is very likely covered.
pub const SELECTION_MARGIN: u64 = 50_000;

/// Estimated serialized size of one signed P2PKH input, in bytes.
pub const EST_INPUT_SIZE: u64 = 148;

/// Estimated serialized size of one P2PKH output, in bytes.
pub const EST_OUTPUT_SIZE: u64 = 34;

/// Fixed per-transaction overhead (version, counts, lock time), in bytes.
pub const EST_TX_OVERHEAD: u64 = 10;

/// Session lifetime in seconds (24 hours).
pub const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// Number of transactions requested from `searchrawtransactions` per lookup.
///
/// Outputs in history beyond this window are invisible to the balance engine.
pub const DEFAULT_HISTORY_LIMIT: u32 = 500;

/// Default RPC timeout in seconds.
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 15;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coin_matches_decimals() {
        assert_eq!(COIN, 10u64.pow(DECIMALS));
    }

    #[test]
    fn margin_exceeds_dust() {
        assert!(SELECTION_MARGIN > DUST_THRESHOLD);
    }
}

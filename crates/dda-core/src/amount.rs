//! Conversions between decimal coin amounts and integer subunits.
//!
//! User input is parsed as an exact decimal string so no floating point is
//! involved. Values reported by the node as JSON numbers are converted with
//! rounding to the nearest subunit, never truncation.

use crate::constants::{COIN, DECIMALS};
use crate::error::AmountError;

/// Parse a user-supplied amount such as `"1.5"` into subunits.
///
/// ```
/// use dda_core::amount::to_subunits;
/// assert_eq!(to_subunits("1.5").unwrap(), 150_000_000);
/// assert_eq!(to_subunits("0.00000001").unwrap(), 1);
/// ```
pub fn to_subunits(input: &str) -> Result<u64, AmountError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(AmountError::Empty);
    }
    if s.starts_with('-') {
        return Err(AmountError::Negative);
    }
    let s = s.strip_prefix('+').unwrap_or(s);

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(AmountError::Invalid(input.to_string()));
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::Invalid(input.to_string()));
    }
    if frac.len() > DECIMALS as usize {
        return Err(AmountError::TooManyDecimals(DECIMALS));
    }

    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| AmountError::Overflow)?
    };
    let mut frac_units: u64 = 0;
    if !frac.is_empty() {
        let padded = format!("{frac:0<width$}", width = DECIMALS as usize);
        frac_units = padded
            .parse()
            .map_err(|_| AmountError::Invalid(input.to_string()))?;
    }

    whole
        .checked_mul(COIN)
        .and_then(|w| w.checked_add(frac_units))
        .ok_or(AmountError::Overflow)
}

/// Format subunits for display, trimming trailing zeros.
///
/// ```
/// use dda_core::amount::from_subunits;
/// assert_eq!(from_subunits(123_456_789), "1.23456789");
/// assert_eq!(from_subunits(100_000_000), "1");
/// assert_eq!(from_subunits(0), "0");
/// ```
pub fn from_subunits(subunits: u64) -> String {
    let whole = subunits / COIN;
    let frac = subunits % COIN;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:0width$}", width = DECIMALS as usize);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// Convert a coin value reported by the node (a JSON number) to subunits,
/// rounding to the nearest subunit. Returns `None` for negative or
/// non-finite values.
pub fn coins_to_subunits(value: f64) -> Option<u64> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let scaled = (value * COIN as f64).round();
    if scaled > u64::MAX as f64 {
        return None;
    }
    Some(scaled as u64)
}

/// Subunits as a floating coin value, for display only.
pub fn subunits_to_coins(subunits: u64) -> f64 {
    subunits as f64 / COIN as f64
}

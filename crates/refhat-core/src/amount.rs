//! Decimal amount conversion
//!
//! Human amounts ("1.5") are converted to base units exactly once, at the
//! request boundary. Everything downstream works on `u128` base units.

use crate::errors::AmountError;

/// Parse a human decimal amount into base units for a token with `decimals`.
///
/// Accepts `^\d+(\.\d+)?$` only. Zero, signs, exponents and fractions longer
/// than `decimals` are rejected.
pub fn parse_units(quantity: &str, decimals: u8) -> Result<u128, AmountError> {
    to_base_units(quantity, decimals, false)
}

/// Like [`parse_units`], but digits past `decimals` are dropped instead of
/// rejected. Still fails when nothing non-zero survives the cut.
pub fn parse_units_truncated(quantity: &str, decimals: u8) -> Result<u128, AmountError> {
    to_base_units(quantity, decimals, true)
}

fn to_base_units(quantity: &str, decimals: u8, truncate: bool) -> Result<u128, AmountError> {
    let quantity = quantity.trim();
    let (integer, fraction) = match quantity.split_once('.') {
        Some((i, f)) => (i, f),
        None => (quantity, ""),
    };

    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(integer) || (quantity.contains('.') && !is_digits(fraction)) {
        return Err(AmountError::Malformed {
            input: quantity.to_string(),
        });
    }

    let fraction = match fraction.get(..decimals as usize) {
        Some(kept) if truncate => kept,
        _ => fraction,
    };
    if fraction.len() > decimals as usize {
        return Err(AmountError::TooManyDecimals {
            input: quantity.to_string(),
            decimals,
        });
    }

    let padded = format!("{}{:0<width$}", integer, fraction, width = decimals as usize);
    let value = padded.parse::<u128>().map_err(|_| AmountError::Overflow {
        input: quantity.to_string(),
    })?;

    if value == 0 {
        return Err(AmountError::NonPositive);
    }

    Ok(value)
}

/// Check a human amount's shape before the token's decimals are known.
pub fn check_quantity(quantity: &str) -> Result<(), AmountError> {
    let fraction_len = quantity.trim().split_once('.').map_or(0, |(_, f)| f.len());
    let decimals = u8::try_from(fraction_len).map_err(|_| AmountError::Malformed {
        input: quantity.to_string(),
    })?;
    parse_units(quantity, decimals).map(|_| ())
}

/// Render base units as a decimal string without trailing fractional zeros.
pub fn format_units(value: u128, decimals: u8) -> String {
    if decimals == 0 {
        return value.to_string();
    }

    let digits = format!("{:0>width$}", value, width = decimals as usize + 1);
    let split = digits.len() - decimals as usize;
    let (integer, fraction) = digits.split_at(split);
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        integer.to_string()
    } else {
        format!("{}.{}", integer, fraction)
    }
}

/// Convert base units to a JSON-friendly float for display responses.
///
/// Goes through the exact decimal string so whole amounts stay whole.
pub fn units_to_f64(value: u128, decimals: u8) -> f64 {
    format_units(value, decimals).parse().unwrap_or(0.0)
}

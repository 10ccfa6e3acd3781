use crate::error::{Error, Result};
use ethers::types::U256;

/// Largest precision whose scale factor (10^decimals) still fits in a U256.
pub const MAX_DECIMALS: u8 = 77;

/// Format base units as a decimal string with the given precision.
pub fn format_units(value: U256, decimals: u8) -> String {
    ethers::utils::format_units(value, u32::from(decimals)).unwrap_or_else(|_| "0.0".to_string())
}

/// Parse a user-entered decimal string into integer base units.
///
/// Accepts plain non-negative decimals ("100", "2.5", ".5", "3."). Rejects empty input,
/// signs, exponents, separators, and more fractional digits than `decimals` allows
/// (trailing zeros do not count).
///
/// # Errors
/// Returns `Error::AmountParse` carrying the original input.
pub fn parse_amount(input: &str, decimals: u8) -> Result<U256> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::amount_parse(input, "amount cannot be empty"));
    }
    if trimmed.starts_with('-') {
        return Err(Error::amount_parse(input, "amount cannot be negative"));
    }

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(Error::amount_parse(input, "not a number"));
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(Error::amount_parse(input, "not a number"));
    }

    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > usize::from(decimals) {
        return Err(Error::amount_parse(
            input,
            format!("more than {decimals} decimal places"),
        ));
    }

    if decimals > MAX_DECIMALS {
        return Err(Error::amount_parse(
            input,
            format!("token precision {decimals} exceeds {MAX_DECIMALS} decimals"),
        ));
    }

    let too_large = || Error::amount_parse(input, "amount too large");
    let whole = if whole.is_empty() { "0" } else { whole };
    let whole = U256::from_dec_str(whole).map_err(|_| too_large())?;
    let fraction = if fraction.is_empty() {
        U256::zero()
    } else {
        let padded = format!("{fraction:0<width$}", width = usize::from(decimals));
        U256::from_dec_str(&padded).map_err(|_| too_large())?
    };

    whole
        .checked_mul(U256::exp10(usize::from(decimals)))
        .and_then(|scaled| scaled.checked_add(fraction))
        .ok_or_else(too_large)
}

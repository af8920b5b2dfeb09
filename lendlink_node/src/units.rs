// src/units.rs
// Human decimal amounts -> integer base units

use crate::error::{LinkError, LinkResult};
use alloy_primitives::U256;

/// Scale a plain decimal string (`"100"`, `"0.25"`, `".5"`) by `10^decimals`.
///
/// Fractional digits beyond the token precision are rejected rather than
/// rounded. Exponent notation, signs and separators are rejected as well.
pub fn parse_units(amount: &str, decimals: u8) -> LinkResult<U256> {
    let amount = amount.trim();
    let (whole, frac) = match amount.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(LinkError::InvalidAmount(format!("'{}' is not a number", amount)));
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || !all_digits(frac) {
        return Err(LinkError::InvalidAmount(format!("'{}' is not a plain decimal", amount)));
    }

    // Trailing zeros never change the value, so "1.500000" is fine for a 6-decimal token.
    let frac = frac.trim_end_matches('0');
    let decimals = decimals as usize;
    if frac.len() > decimals {
        return Err(LinkError::InvalidAmount(format!(
            "'{}' has more than {} fractional digits",
            amount, decimals
        )));
    }

    let mut digits = String::with_capacity(whole.len() + decimals);
    digits.push_str(whole);
    digits.push_str(frac);
    digits.extend(std::iter::repeat('0').take(decimals - frac.len()));
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }

    U256::from_str_radix(digits, 10)
        .map_err(|_| LinkError::InvalidAmount(format!("'{}' overflows uint256", amount)))
}

//! Fixed-point decimal formatting for integer token amounts.
//!
//! All entity amounts are stored as raw integers scaled by the token's
//! `decimals`; these functions render them as human-readable decimal strings
//! and compute the reserve ratio between two differently scaled amounts.
//! Purely functional, safe to call concurrently.

use alloy::primitives::U256;
use num_bigint::{BigInt, Sign};
use num_traits::Zero;

use crate::utils::conversion::{big_pow10, u256_to_bigint};

/// Render an integer amount as a decimal string with `decimals` fractional
/// digits. Trailing fractional zeros are trimmed and a zero fraction is
/// omitted entirely, so `1_500_000 @ 6` renders as `"1.5"` and
/// `10^18 @ 18` as `"1"`. Negative amounts keep their sign.
///
/// Returns `"0"` when `amount` is zero without further formatting.
pub fn format_units(amount: &BigInt, decimals: u8) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }

    let negative = amount.sign() == Sign::Minus;
    let magnitude = amount.magnitude();
    let scale = big_pow10(decimals as u32);
    let scale = scale.magnitude();

    let integer = magnitude / scale;
    let fraction = magnitude % scale;

    let mut out = integer.to_string();
    if !fraction.is_zero() {
        let mut digits = format!("{:0>width$}", fraction.to_string(), width = decimals as usize);
        while digits.ends_with('0') {
            digits.pop();
        }
        out.push('.');
        out.push_str(&digits);
    }

    if negative {
        out.insert(0, '-');
    }
    out
}

/// [`format_units`] over an unsigned alloy U256.
pub fn format_u256(value: U256, decimals: u8) -> String {
    format_units(&u256_to_bigint(value), decimals)
}

/// Ratio between two token amounts carrying different decimal scales,
/// rendered with 18 fractional digits.
///
/// Both amounts are normalized to a common 18-decimal scale
/// (`amount * 10^(18 - decimals)`) before dividing, so the result is
/// independent of the tokens' native scales. Returns `"0"` whenever the
/// normalized quote amount is zero (which includes a zero `quote`); the
/// division never sees a zero divisor.
///
/// Precondition: `base_decimals <= 18` and `quote_decimals <= 18`. No token
/// in this domain exceeds 18 decimals; larger values are undefined here.
pub fn ratio(base: U256, base_decimals: u8, quote: U256, quote_decimals: u8) -> String {
    debug_assert!(base_decimals <= 18 && quote_decimals <= 18);

    if quote.is_zero() {
        return "0".to_string();
    }

    let normalized_base = u256_to_bigint(base) * big_pow10(18 - base_decimals as u32);
    let normalized_quote = u256_to_bigint(quote) * big_pow10(18 - quote_decimals as u32);

    if normalized_quote.is_zero() {
        return "0".to_string();
    }

    format_units(&(normalized_base * big_pow10(18) / normalized_quote), 18)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_zero_is_bare_zero_for_any_scale() {
        for decimals in [0u8, 6, 18, 24] {
            assert_eq!(format_units(&BigInt::ZERO, decimals), "0");
            assert_eq!(format_u256(U256::ZERO, decimals), "0");
        }
    }

    #[test]
    fn test_format_whole_amounts_drop_the_fraction() {
        let one_ether = U256::from(10u128).pow(U256::from(18));
        assert_eq!(format_u256(one_ether, 18), "1");
        assert_eq!(format_u256(U256::from(25_000_000u64), 6), "25");
    }

    #[test]
    fn test_format_trims_trailing_fractional_zeros() {
        assert_eq!(format_u256(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_u256(U256::from(1_050_000u64), 6), "1.05");
    }

    #[test]
    fn test_format_sub_unit_amounts_pad_leading_zeros() {
        assert_eq!(format_u256(U256::from(123u64), 6), "0.000123");
        assert_eq!(format_u256(U256::from(1u64), 18), "0.000000000000000001");
    }

    #[test]
    fn test_format_zero_decimals_is_plain_integer() {
        assert_eq!(format_u256(U256::from(123_456u64), 0), "123456");
    }

    #[test]
    fn test_format_negative_amounts_keep_sign() {
        assert_eq!(format_units(&BigInt::from(-1_500_000i64), 6), "-1.5");
        assert_eq!(format_units(&BigInt::from(-5i64), 6), "-0.000005");
    }

    #[test]
    fn test_ratio_zero_quote_is_zero_for_any_scales() {
        let base = U256::from(10u128).pow(U256::from(18));
        for (d0, d1) in [(18u8, 18u8), (18, 6), (6, 18), (0, 0)] {
            assert_eq!(ratio(base, d0, U256::ZERO, d1), "0");
            assert_eq!(ratio(U256::ZERO, d0, U256::ZERO, d1), "0");
        }
    }

    #[test]
    fn test_ratio_equal_scales() {
        // 2e18 / 1e18 = 2
        let two = U256::from(2u64) * U256::from(10u128).pow(U256::from(18));
        let one = U256::from(10u128).pow(U256::from(18));
        assert_eq!(ratio(two, 18, one, 18), "2");
    }

    #[test]
    fn test_ratio_normalizes_mixed_scales() {
        // 1 token0 @ 18 decimals vs 2 token1 @ 6 decimals => 0.5
        let one_e18 = U256::from(10u128).pow(U256::from(18));
        let two_e6 = U256::from(2_000_000u64);
        assert_eq!(ratio(one_e18, 18, two_e6, 6), "0.5");
    }

    #[test]
    fn test_ratio_fractional_result() {
        // 1 / 3 with 18-digit precision
        let one = U256::from(10u128).pow(U256::from(18));
        let three = U256::from(3u64) * U256::from(10u128).pow(U256::from(18));
        assert_eq!(ratio(one, 18, three, 18), "0.333333333333333333");
    }
}

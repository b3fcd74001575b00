//! Type conversion utilities.
//!
//! Functions for converting between alloy primitives and num-bigint types
//! without precision loss.

use alloy::primitives::{hex, U256};
use num_bigint::{BigInt, Sign};
use once_cell::sync::Lazy;

// ============================================
// Hex Encoding
// ============================================

/// Encode bytes as a lowercase hex string with 0x prefix.
pub fn hex_encode(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

// ============================================
// U256 Conversions
// ============================================

/// Convert alloy U256 to a signed BigInt.
///
/// Goes through the little-endian byte representation (faster than string
/// parsing) and is lossless for the full U256 range.
pub fn u256_to_bigint(value: U256) -> BigInt {
    let bytes: [u8; 32] = value.to_le_bytes();
    BigInt::from_bytes_le(Sign::Plus, &bytes)
}

// ============================================
// Internal Helpers
// ============================================

static POW10_CACHE: Lazy<[BigInt; 37]> =
    Lazy::new(|| std::array::from_fn(|i| BigInt::from(10u32).pow(i as u32)));

/// Compute 10^exp as BigInt.
pub(crate) fn big_pow10(exp: u32) -> BigInt {
    if (exp as usize) < POW10_CACHE.len() {
        POW10_CACHE[exp as usize].clone()
    } else {
        BigInt::from(10u32).pow(exp)
    }
}

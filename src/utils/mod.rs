//! Utility functions for the Aeroflow aggregation engine.
//!
//! This module is organized into focused submodules:
//!
//! - [`conversion`] - Type conversions (U256, BigInt, hex encoding)
//! - [`decimal`] - Fixed-point formatting and pool ratio calculation

mod conversion;
mod decimal;

// Conversion utilities
pub use conversion::{hex_encode, u256_to_bigint};

// Decimal engine
pub use decimal::{format_u256, format_units, ratio};

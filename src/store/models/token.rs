use alloy::primitives::U256;
use num_bigint::BigInt;
use serde::Serialize;

use crate::chain::TokenMetadata;
use crate::utils::{format_u256, format_units};

/// ERC-20 token metadata plus cumulative trading statistics.
///
/// Keyed by the lower-cased token address. The metadata fields (`symbol`,
/// `name`, `decimals`, `total_supply`) are written once at creation and
/// never rewritten; the counters are monotonic except `total_liquidity`,
/// which is signed and may transiently go negative when a burn is processed
/// before the mint that funded it.
#[derive(Debug, Clone, Serialize)]
pub struct Token {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub total_supply: U256,
    pub total_supply_formatted: String,
    pub trade_volume: U256,
    pub trade_volume_formatted: String,
    pub tx_count: u64,
    pub total_liquidity: BigInt,
    pub total_liquidity_formatted: String,
}

impl Token {
    pub fn new(address: &str, metadata: TokenMetadata) -> Self {
        Self {
            id: address.to_lowercase(),
            symbol: metadata.symbol,
            name: metadata.name,
            decimals: metadata.decimals,
            total_supply_formatted: format_u256(metadata.total_supply, metadata.decimals),
            total_supply: metadata.total_supply,
            trade_volume: U256::ZERO,
            trade_volume_formatted: "0".to_string(),
            tx_count: 0,
            total_liquidity: BigInt::ZERO,
            total_liquidity_formatted: "0".to_string(),
        }
    }

    /// Accumulate swap volume denominated in this token.
    pub fn record_volume(&mut self, amount: U256) {
        self.trade_volume += amount;
        self.trade_volume_formatted = format_u256(self.trade_volume, self.decimals);
        self.tx_count += 1;
    }

    /// Apply a signed liquidity delta (positive for mint, negative for burn).
    /// No clamping: the running total is allowed to go negative.
    pub fn record_liquidity(&mut self, delta: &BigInt) {
        self.total_liquidity += delta;
        self.total_liquidity_formatted = format_units(&self.total_liquidity, self.decimals);
        self.tx_count += 1;
    }
}

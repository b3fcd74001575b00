use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::store::models::Token;
use crate::utils::{format_u256, ratio};

/// LP tokens always carry 18 decimals regardless of the pair's tokens.
pub const LP_TOKEN_DECIMALS: u8 = 18;

/// Liquidity pool state and cumulative trading statistics.
///
/// Keyed by the lower-cased pool address. `token0`/`token1` are fixed at
/// creation and never swapped. Reserves and LP supply always mirror the
/// most recent successfully read on-chain state as of the block of the
/// last processed event for this pool.
#[derive(Debug, Clone, Serialize)]
pub struct Pool {
    pub id: String,
    pub token0: String,
    pub token1: String,
    pub reserve0: U256,
    pub reserve0_formatted: String,
    pub reserve1: U256,
    pub reserve1_formatted: String,
    pub total_supply: U256,
    pub total_supply_formatted: String,
    /// Reserve ratio token0/token1 at 18-digit precision, replacing
    /// per-token price fields.
    pub ratio: String,
    pub volume_token0: U256,
    pub volume_token0_formatted: String,
    pub volume_token1: U256,
    pub volume_token1_formatted: String,
    pub tx_count: u64,
    pub created_at_timestamp: u64,
    pub created_at_block_number: u64,
    pub is_stable: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Pool {
    pub fn new(
        address: &str,
        token0: &Token,
        token1: &Token,
        is_stable: bool,
        block_number: u64,
        timestamp: u64,
    ) -> Self {
        Self {
            id: address.to_lowercase(),
            token0: token0.id.clone(),
            token1: token1.id.clone(),
            reserve0: U256::ZERO,
            reserve0_formatted: "0".to_string(),
            reserve1: U256::ZERO,
            reserve1_formatted: "0".to_string(),
            total_supply: U256::ZERO,
            total_supply_formatted: "0".to_string(),
            ratio: "0".to_string(),
            volume_token0: U256::ZERO,
            volume_token0_formatted: "0".to_string(),
            volume_token1: U256::ZERO,
            volume_token1_formatted: "0".to_string(),
            tx_count: 0,
            created_at_timestamp: timestamp,
            created_at_block_number: block_number,
            is_stable,
            updated_at: DateTime::from_timestamp(timestamp as i64, 0),
        }
    }

    /// Overwrite reserves and LP supply with freshly read on-chain state,
    /// recompute the ratio and advance the tx counter.
    ///
    /// Last write wins: callers must apply events for one pool in chain
    /// order, or the snapshot ends up at a stale block's values.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_reserves(
        &mut self,
        reserve0: U256,
        reserve1: U256,
        total_supply: U256,
        decimals0: u8,
        decimals1: u8,
        timestamp: u64,
    ) {
        self.reserve0 = reserve0;
        self.reserve0_formatted = format_u256(reserve0, decimals0);
        self.reserve1 = reserve1;
        self.reserve1_formatted = format_u256(reserve1, decimals1);
        self.total_supply = total_supply;
        self.total_supply_formatted = format_u256(total_supply, LP_TOKEN_DECIMALS);
        self.ratio = ratio(reserve0, decimals0, reserve1, decimals1);
        self.tx_count += 1;
        self.updated_at = DateTime::from_timestamp(timestamp as i64, 0);
    }

    /// Accumulate trading volume. Swaps only; mints and burns contribute
    /// zero trading volume.
    pub fn add_volume(&mut self, amount0: U256, amount1: U256, decimals0: u8, decimals1: u8) {
        self.volume_token0 += amount0;
        self.volume_token0_formatted = format_u256(self.volume_token0, decimals0);
        self.volume_token1 += amount1;
        self.volume_token1_formatted = format_u256(self.volume_token1, decimals1);
    }
}

use alloy::primitives::U256;
use num_bigint::BigInt;
use serde::Serialize;

use crate::store::models::pool::LP_TOKEN_DECIMALS;
use crate::utils::{format_u256, format_units};

/// Pool reserves and LP supply read from the chain at one block.
#[derive(Debug, Clone, Copy)]
pub struct ReserveSnapshot {
    pub reserve0: U256,
    pub reserve1: U256,
    pub total_supply: U256,
}

/// Hourly rollup for one pool, keyed by `"{pool}-{hour_start}"`.
///
/// The reserve/supply fields hold the snapshot as of the last event that
/// landed in the bucket; the `hourly_*` fields accumulate deltas within it.
#[derive(Debug, Clone, Serialize)]
pub struct PoolHourData {
    pub id: String,
    pub hour_start_unix: u64,
    pub pool: String,
    pub reserve0: U256,
    pub reserve0_formatted: String,
    pub reserve1: U256,
    pub reserve1_formatted: String,
    pub total_supply: U256,
    pub total_supply_formatted: String,
    pub hourly_volume_token0: U256,
    pub hourly_volume_token0_formatted: String,
    pub hourly_volume_token1: U256,
    pub hourly_volume_token1_formatted: String,
    pub hourly_tx_count: u64,
}

impl PoolHourData {
    /// Zeroed bucket row. The first merge fills the snapshot and deltas.
    pub fn seed(pool: &str, hour_start: u64) -> Self {
        Self {
            id: format!("{pool}-{hour_start}"),
            hour_start_unix: hour_start,
            pool: pool.to_string(),
            reserve0: U256::ZERO,
            reserve0_formatted: "0".to_string(),
            reserve1: U256::ZERO,
            reserve1_formatted: "0".to_string(),
            total_supply: U256::ZERO,
            total_supply_formatted: "0".to_string(),
            hourly_volume_token0: U256::ZERO,
            hourly_volume_token0_formatted: "0".to_string(),
            hourly_volume_token1: U256::ZERO,
            hourly_volume_token1_formatted: "0".to_string(),
            hourly_tx_count: 0,
        }
    }

    /// Fold one event into the bucket: the snapshot is overwritten (last
    /// write within the bucket wins), the volume/tx deltas accumulate.
    pub fn absorb(
        &mut self,
        snapshot: &ReserveSnapshot,
        volume0: U256,
        volume1: U256,
        decimals0: u8,
        decimals1: u8,
    ) {
        self.reserve0 = snapshot.reserve0;
        self.reserve0_formatted = format_u256(snapshot.reserve0, decimals0);
        self.reserve1 = snapshot.reserve1;
        self.reserve1_formatted = format_u256(snapshot.reserve1, decimals1);
        self.total_supply = snapshot.total_supply;
        self.total_supply_formatted = format_u256(snapshot.total_supply, LP_TOKEN_DECIMALS);
        self.hourly_volume_token0 += volume0;
        self.hourly_volume_token0_formatted = format_u256(self.hourly_volume_token0, decimals0);
        self.hourly_volume_token1 += volume1;
        self.hourly_volume_token1_formatted = format_u256(self.hourly_volume_token1, decimals1);
        self.hourly_tx_count += 1;
    }
}

/// Daily rollup for one pool, keyed by `"{pool}-{day_start}"`.
///
/// Carries the pair's token references alongside the snapshot so day rows
/// can be queried without joining through the pool.
#[derive(Debug, Clone, Serialize)]
pub struct PoolDayData {
    pub id: String,
    pub date: u64,
    pub pool: String,
    pub token0: String,
    pub token1: String,
    pub reserve0: U256,
    pub reserve0_formatted: String,
    pub reserve1: U256,
    pub reserve1_formatted: String,
    pub total_supply: U256,
    pub total_supply_formatted: String,
    pub daily_volume_token0: U256,
    pub daily_volume_token0_formatted: String,
    pub daily_volume_token1: U256,
    pub daily_volume_token1_formatted: String,
    pub daily_tx_count: u64,
}

impl PoolDayData {
    pub fn seed(pool: &str, token0: &str, token1: &str, day_start: u64) -> Self {
        Self {
            id: format!("{pool}-{day_start}"),
            date: day_start,
            pool: pool.to_string(),
            token0: token0.to_string(),
            token1: token1.to_string(),
            reserve0: U256::ZERO,
            reserve0_formatted: "0".to_string(),
            reserve1: U256::ZERO,
            reserve1_formatted: "0".to_string(),
            total_supply: U256::ZERO,
            total_supply_formatted: "0".to_string(),
            daily_volume_token0: U256::ZERO,
            daily_volume_token0_formatted: "0".to_string(),
            daily_volume_token1: U256::ZERO,
            daily_volume_token1_formatted: "0".to_string(),
            daily_tx_count: 0,
        }
    }

    pub fn absorb(
        &mut self,
        snapshot: &ReserveSnapshot,
        volume0: U256,
        volume1: U256,
        decimals0: u8,
        decimals1: u8,
    ) {
        self.reserve0 = snapshot.reserve0;
        self.reserve0_formatted = format_u256(snapshot.reserve0, decimals0);
        self.reserve1 = snapshot.reserve1;
        self.reserve1_formatted = format_u256(snapshot.reserve1, decimals1);
        self.total_supply = snapshot.total_supply;
        self.total_supply_formatted = format_u256(snapshot.total_supply, LP_TOKEN_DECIMALS);
        self.daily_volume_token0 += volume0;
        self.daily_volume_token0_formatted = format_u256(self.daily_volume_token0, decimals0);
        self.daily_volume_token1 += volume1;
        self.daily_volume_token1_formatted = format_u256(self.daily_volume_token1, decimals1);
        self.daily_tx_count += 1;
    }
}

/// Daily rollup for one token, keyed by `"{token}-{day_start}"`.
#[derive(Debug, Clone, Serialize)]
pub struct TokenDayData {
    pub id: String,
    pub date: u64,
    pub token: String,
    pub daily_volume_token: U256,
    pub daily_volume_token_formatted: String,
    pub daily_tx_count: u64,
    pub total_liquidity_token: BigInt,
    pub total_liquidity_token_formatted: String,
}

impl TokenDayData {
    pub fn seed(token: &str, day_start: u64) -> Self {
        Self {
            id: format!("{token}-{day_start}"),
            date: day_start,
            token: token.to_string(),
            daily_volume_token: U256::ZERO,
            daily_volume_token_formatted: "0".to_string(),
            daily_tx_count: 0,
            total_liquidity_token: BigInt::ZERO,
            total_liquidity_token_formatted: "0".to_string(),
        }
    }

    /// Fold one event in: volume accumulates, the liquidity snapshot is
    /// overwritten with the token's post-event running total.
    pub fn absorb(&mut self, volume: U256, liquidity: &BigInt, decimals: u8) {
        self.daily_volume_token += volume;
        self.daily_volume_token_formatted = format_u256(self.daily_volume_token, decimals);
        self.daily_tx_count += 1;
        self.total_liquidity_token = liquidity.clone();
        self.total_liquidity_token_formatted = format_units(liquidity, decimals);
    }
}

//! Windowed rollups: hour/day buckets per pool and day buckets per token.
//!
//! Buckets are created on the first event that lands in a not-yet-seen
//! window and merged into afterwards, through the store's atomic
//! upsert-with-merge primitive.

use std::sync::Arc;

use alloy::primitives::U256;

use crate::store::{
    models::{Pool, PoolDayData, PoolHourData, ReserveSnapshot, Token, TokenDayData},
    EntityStore, StoreError,
};

pub const HOUR_SECONDS: u64 = 3600;
pub const DAY_SECONDS: u64 = 86400;

/// Start of the fixed-width window containing `timestamp`.
pub fn bucket_start(timestamp: u64, window_seconds: u64) -> u64 {
    timestamp / window_seconds * window_seconds
}

pub struct RollupManager {
    store: Arc<dyn EntityStore>,
}

impl RollupManager {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Fold one event into the pool's hour and day buckets. Volume deltas
    /// are zero for mint/burn; the tx counter and snapshot always advance.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_pool_buckets(
        &self,
        pool: &Pool,
        timestamp: u64,
        snapshot: &ReserveSnapshot,
        volume0: U256,
        volume1: U256,
        decimals0: u8,
        decimals1: u8,
    ) -> Result<(), StoreError> {
        let hour_start = bucket_start(timestamp, HOUR_SECONDS);
        let hour_seed = PoolHourData::seed(&pool.id, hour_start);
        let snap = *snapshot;
        self.store
            .upsert_pool_hour(
                hour_seed,
                Box::new(move |row| row.absorb(&snap, volume0, volume1, decimals0, decimals1)),
            )
            .await?;

        let day_start = bucket_start(timestamp, DAY_SECONDS);
        let day_seed = PoolDayData::seed(&pool.id, &pool.token0, &pool.token1, day_start);
        self.store
            .upsert_pool_day(
                day_seed,
                Box::new(move |row| row.absorb(&snap, volume0, volume1, decimals0, decimals1)),
            )
            .await?;

        Ok(())
    }

    /// Fold one event into the token's day bucket. The liquidity snapshot
    /// is the token's post-event running total.
    pub async fn record_token_day(
        &self,
        token: &Token,
        timestamp: u64,
        volume: U256,
    ) -> Result<(), StoreError> {
        let day_start = bucket_start(timestamp, DAY_SECONDS);
        let seed = TokenDayData::seed(&token.id, day_start);
        let liquidity = token.total_liquidity.clone();
        let decimals = token.decimals;
        self.store
            .upsert_token_day(
                seed,
                Box::new(move |row| row.absorb(volume, &liquidity, decimals)),
            )
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_start_floors_to_window() {
        assert_eq!(bucket_start(0, HOUR_SECONDS), 0);
        assert_eq!(bucket_start(3599, HOUR_SECONDS), 0);
        assert_eq!(bucket_start(3600, HOUR_SECONDS), 3600);
        assert_eq!(bucket_start(7201, HOUR_SECONDS), 7200);
        assert_eq!(bucket_start(90_000, DAY_SECONDS), 86_400);
        assert_eq!(bucket_start(86_399, DAY_SECONDS), 0);
    }
}

//! Pool lifecycle: factory counters and pool creation.
//!
//! Reserve/supply overwrites and volume accumulation after creation live
//! on the `Pool` model itself and are driven by the dispatcher.

use std::sync::Arc;

use log::info;

use crate::engine::registry::TokenRegistry;
use crate::error::EngineError;
use crate::store::{
    models::{Factory, Pool},
    EntityStore, StoreError,
};

pub struct PoolManager {
    store: Arc<dyn EntityStore>,
    registry: TokenRegistry,
}

impl PoolManager {
    pub fn new(store: Arc<dyn EntityStore>, registry: TokenRegistry) -> Self {
        Self { store, registry }
    }

    /// Apply one factory PoolCreated event: resolve both tokens, bump the
    /// factory counters and create the zeroed pool row.
    ///
    /// Token resolution (the only external reads) happens before the first
    /// mutation, so a failed metadata read leaves the factory counters
    /// untouched. A second creation for the same pool address is a hard
    /// fault, never silently overwritten.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_pool(
        &self,
        factory_address: &str,
        token0_address: &str,
        token1_address: &str,
        is_stable: bool,
        pool_address: &str,
        block_number: u64,
        timestamp: u64,
    ) -> Result<Pool, EngineError> {
        let token0 = self.registry.ensure_token(token0_address, block_number).await?;
        let token1 = self.registry.ensure_token(token1_address, block_number).await?;

        self.store
            .upsert_factory(
                Factory::new(factory_address),
                Box::new(|factory| {
                    factory.pool_count += 1;
                    factory.tx_count += 1;
                }),
            )
            .await?;

        let row = Pool::new(pool_address, &token0, &token1, is_stable, block_number, timestamp);
        let pool = match self.store.create_pool(row).await {
            Ok(pool) => pool,
            Err(StoreError::Conflict { id, .. }) => {
                return Err(EngineError::DuplicatePool(id));
            },
            Err(e) => return Err(e.into()),
        };

        info!(
            "New pool {} ({}/{}, stable={}) at block {}",
            pool.id, token0.symbol, token1.symbol, is_stable, block_number
        );

        Ok(pool)
    }
}

//! Event dispatcher: routes decoded feed events to the handlers.
//!
//! Events must arrive in non-decreasing (block number, log index) order.
//! Reserves and LP supply are overwritten from block-scoped reads, so two
//! events for the same pool applied out of chain order leave the snapshot
//! at a stale block's values. The engine applies events sequentially;
//! callers that parallelize must serialize all events for a given pool
//! (and its two tokens) behind one writer.
//!
//! Every handler awaits all chain reads before its first mutation, so a
//! failed read discards the event with no partial counter updates.

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use moka::future::Cache;

use crate::chain::{ChainReader, EventMeta, PoolEvent};
use crate::engine::pools::PoolManager;
use crate::engine::registry::TokenRegistry;
use crate::engine::rollups::RollupManager;
use crate::error::EngineError;
use crate::store::models::{
    Burn, Mint, Pool, ReserveSnapshot, Swap, Token, Transaction,
};
use crate::store::{EntityStore, StoreError};
use crate::utils::u256_to_bigint;
use alloy::primitives::U256;

/// Capacity of the untracked-pool cache.
const UNTRACKED_CACHE_CAPACITY: u64 = 10_000;

/// TTL of the untracked-pool cache. Entries expire so a stale negative
/// answer cannot outlive a replayed feed segment.
const UNTRACKED_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Result of applying one feed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// The event referenced a pool this factory never created. Skipped by
    /// design, not an error.
    UnknownPool,
}

pub struct Engine {
    store: Arc<dyn EntityStore>,
    reader: Arc<dyn ChainReader>,
    pools: PoolManager,
    rollups: RollupManager,
    /// Addresses seen emitting swap/mint/burn without a tracked pool row.
    /// Pools from foreign factories emit the same topics; this avoids a
    /// store round-trip for every one of their events.
    untracked: Cache<String, ()>,
}

impl Engine {
    pub fn new(store: Arc<dyn EntityStore>, reader: Arc<dyn ChainReader>) -> Self {
        let registry = TokenRegistry::new(store.clone(), reader.clone());
        let pools = PoolManager::new(store.clone(), registry);
        let rollups = RollupManager::new(store.clone());

        let untracked = Cache::builder()
            .max_capacity(UNTRACKED_CACHE_CAPACITY)
            .time_to_live(UNTRACKED_CACHE_TTL)
            .build();

        Self {
            store,
            reader,
            pools,
            rollups,
            untracked,
        }
    }

    /// Apply one feed event. Must be called in chain order.
    pub async fn apply(&self, meta: &EventMeta, event: &PoolEvent) -> Result<Outcome, EngineError> {
        match event {
            PoolEvent::PoolCreated {
                token0,
                token1,
                stable,
                pool,
            } => {
                self.pools
                    .create_pool(
                        &meta.address,
                        token0,
                        token1,
                        *stable,
                        pool,
                        meta.block_number,
                        meta.block_timestamp,
                    )
                    .await?;
                Ok(Outcome::Applied)
            },
            PoolEvent::Swap {
                sender,
                to,
                amount0_in,
                amount1_in,
                amount0_out,
                amount1_out,
            } => {
                self.handle_swap(
                    meta,
                    sender,
                    to,
                    *amount0_in,
                    *amount1_in,
                    *amount0_out,
                    *amount1_out,
                )
                .await
            },
            PoolEvent::Mint {
                sender,
                amount0,
                amount1,
            } => self.handle_mint(meta, sender, *amount0, *amount1).await,
            PoolEvent::Burn {
                sender,
                to,
                amount0,
                amount1,
            } => self.handle_burn(meta, sender, to, *amount0, *amount1).await,
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn handle_swap(
        &self,
        meta: &EventMeta,
        sender: &str,
        to: &str,
        amount0_in: U256,
        amount1_in: U256,
        amount0_out: U256,
        amount1_out: U256,
    ) -> Result<Outcome, EngineError> {
        let Some(mut pool) = self.lookup_pool(&meta.address).await? else {
            return Ok(Outcome::UnknownPool);
        };
        let mut token0 = self.require_token(&pool.token0).await?;
        let mut token1 = self.require_token(&pool.token1).await?;

        let snapshot = self.read_pool_state(&pool.id, meta.block_number).await?;
        // All chain reads done; mutations start here.

        let amount0_total = amount0_in + amount0_out;
        let amount1_total = amount1_in + amount1_out;

        self.store.upsert_transaction(Transaction::new(meta)).await?;
        self.store
            .insert_swap(Swap::new(
                meta, &pool, &token0, &token1, sender, to, amount0_in, amount1_in, amount0_out,
                amount1_out,
            ))
            .await?;

        pool.add_volume(amount0_total, amount1_total, token0.decimals, token1.decimals);
        pool.apply_reserves(
            snapshot.reserve0,
            snapshot.reserve1,
            snapshot.total_supply,
            token0.decimals,
            token1.decimals,
            meta.block_timestamp,
        );
        self.store.update_pool(pool.clone()).await?;

        token0.record_volume(amount0_total);
        token1.record_volume(amount1_total);
        self.store.update_token(token0.clone()).await?;
        self.store.update_token(token1.clone()).await?;

        self.rollups
            .record_pool_buckets(
                &pool,
                meta.block_timestamp,
                &snapshot,
                amount0_total,
                amount1_total,
                token0.decimals,
                token1.decimals,
            )
            .await?;
        self.rollups
            .record_token_day(&token0, meta.block_timestamp, amount0_total)
            .await?;
        self.rollups
            .record_token_day(&token1, meta.block_timestamp, amount1_total)
            .await?;

        Ok(Outcome::Applied)
    }

    async fn handle_mint(
        &self,
        meta: &EventMeta,
        sender: &str,
        amount0: U256,
        amount1: U256,
    ) -> Result<Outcome, EngineError> {
        let Some(mut pool) = self.lookup_pool(&meta.address).await? else {
            return Ok(Outcome::UnknownPool);
        };
        let mut token0 = self.require_token(&pool.token0).await?;
        let mut token1 = self.require_token(&pool.token1).await?;

        let snapshot = self.read_pool_state(&pool.id, meta.block_number).await?;

        self.store.upsert_transaction(Transaction::new(meta)).await?;
        self.store
            .insert_mint(Mint::new(meta, &pool, &token0, &token1, sender, amount0, amount1))
            .await?;

        pool.apply_reserves(
            snapshot.reserve0,
            snapshot.reserve1,
            snapshot.total_supply,
            token0.decimals,
            token1.decimals,
            meta.block_timestamp,
        );
        self.store.update_pool(pool.clone()).await?;

        token0.record_liquidity(&u256_to_bigint(amount0));
        token1.record_liquidity(&u256_to_bigint(amount1));
        self.store.update_token(token0.clone()).await?;
        self.store.update_token(token1.clone()).await?;

        self.record_zero_volume_rollups(&pool, &token0, &token1, meta, &snapshot)
            .await?;

        Ok(Outcome::Applied)
    }

    async fn handle_burn(
        &self,
        meta: &EventMeta,
        sender: &str,
        to: &str,
        amount0: U256,
        amount1: U256,
    ) -> Result<Outcome, EngineError> {
        let Some(mut pool) = self.lookup_pool(&meta.address).await? else {
            return Ok(Outcome::UnknownPool);
        };
        let mut token0 = self.require_token(&pool.token0).await?;
        let mut token1 = self.require_token(&pool.token1).await?;

        let snapshot = self.read_pool_state(&pool.id, meta.block_number).await?;

        self.store.upsert_transaction(Transaction::new(meta)).await?;
        self.store
            .insert_burn(Burn::new(
                meta, &pool, &token0, &token1, sender, to, amount0, amount1,
            ))
            .await?;

        pool.apply_reserves(
            snapshot.reserve0,
            snapshot.reserve1,
            snapshot.total_supply,
            token0.decimals,
            token1.decimals,
            meta.block_timestamp,
        );
        self.store.update_pool(pool.clone()).await?;

        token0.record_liquidity(&-u256_to_bigint(amount0));
        token1.record_liquidity(&-u256_to_bigint(amount1));
        self.store.update_token(token0.clone()).await?;
        self.store.update_token(token1.clone()).await?;

        self.record_zero_volume_rollups(&pool, &token0, &token1, meta, &snapshot)
            .await?;

        Ok(Outcome::Applied)
    }

    async fn record_zero_volume_rollups(
        &self,
        pool: &Pool,
        token0: &Token,
        token1: &Token,
        meta: &EventMeta,
        snapshot: &ReserveSnapshot,
    ) -> Result<(), EngineError> {
        self.rollups
            .record_pool_buckets(
                pool,
                meta.block_timestamp,
                snapshot,
                U256::ZERO,
                U256::ZERO,
                token0.decimals,
                token1.decimals,
            )
            .await?;
        self.rollups
            .record_token_day(token0, meta.block_timestamp, U256::ZERO)
            .await?;
        self.rollups
            .record_token_day(token1, meta.block_timestamp, U256::ZERO)
            .await?;
        Ok(())
    }

    async fn lookup_pool(&self, address: &str) -> Result<Option<Pool>, EngineError> {
        let id = address.to_lowercase();

        if self.untracked.contains_key(&id) {
            return Ok(None);
        }

        match self.store.get_pool(&id).await? {
            Some(pool) => Ok(Some(pool)),
            None => {
                debug!("Skipping event for untracked pool {id}");
                self.untracked.insert(id, ()).await;
                Ok(None)
            },
        }
    }

    async fn require_token(&self, id: &str) -> Result<Token, EngineError> {
        let token = self.store.get_token(id).await?.ok_or_else(|| StoreError::NotFound {
            kind: "Token",
            id: id.to_string(),
        })?;
        Ok(token)
    }

    async fn read_pool_state(
        &self,
        pool_id: &str,
        block: u64,
    ) -> Result<ReserveSnapshot, EngineError> {
        let reserves = self.reader.read_reserves(pool_id, block);
        let supply = self.reader.read_total_supply(pool_id, block);

        let ((reserve0, reserve1), total_supply) =
            futures::try_join!(reserves, supply).map_err(|source| EngineError::ExternalRead {
                context: format!("pool state for {pool_id} at block {block}"),
                source,
            })?;

        Ok(ReserveSnapshot {
            reserve0,
            reserve1,
            total_supply,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::chain::TokenMetadata;
    use crate::engine::rollups::{bucket_start, DAY_SECONDS, HOUR_SECONDS};
    use crate::store::MemoryStore;

    const FACTORY: &str = "0x420dd381b31aef6683db6b902084cb0ffece40da";
    const WETH: &str = "0x4200000000000000000000000000000000000006";
    const USDC: &str = "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913";
    const DAI: &str = "0x50c5725949a6f0c72e6c4a641f24049a917db0cb";
    const POOL: &str = "0xb4885bc63399bf5518b994c1d0c153334ee579d0";
    const POOL_2: &str = "0x9e4cb8b916289864321661ce02cf66aa5ba63c94";
    const SENDER: &str = "0x1111111111111111111111111111111111111111";
    const RECIPIENT: &str = "0x2222222222222222222222222222222222222222";

    const T0: u64 = 1_700_000_000;

    fn eth(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18))
    }

    fn usdc_units(n: u64) -> U256 {
        U256::from(n) * U256::from(1_000_000u64)
    }

    struct MockReader {
        metadata: Mutex<HashMap<String, TokenMetadata>>,
        pool_state: Mutex<HashMap<(String, u64), ReserveSnapshot>>,
        fail_reads: AtomicBool,
        metadata_fetches: Mutex<HashMap<String, usize>>,
    }

    impl MockReader {
        fn new() -> Self {
            let reader = Self {
                metadata: Mutex::new(HashMap::new()),
                pool_state: Mutex::new(HashMap::new()),
                fail_reads: AtomicBool::new(false),
                metadata_fetches: Mutex::new(HashMap::new()),
            };
            reader.add_token(WETH, "WETH", "Wrapped Ether", 18, eth(120_000_000));
            reader.add_token(USDC, "USDC", "USD Coin", 6, usdc_units(30_000_000_000));
            reader
        }

        fn add_token(&self, address: &str, symbol: &str, name: &str, decimals: u8, supply: U256) {
            self.metadata.lock().unwrap().insert(
                address.to_string(),
                TokenMetadata {
                    symbol: symbol.to_string(),
                    name: name.to_string(),
                    decimals,
                    total_supply: supply,
                },
            );
        }

        fn set_pool_state(
            &self,
            pool: &str,
            block: u64,
            reserve0: U256,
            reserve1: U256,
            total_supply: U256,
        ) {
            self.pool_state.lock().unwrap().insert(
                (pool.to_string(), block),
                ReserveSnapshot {
                    reserve0,
                    reserve1,
                    total_supply,
                },
            );
        }

        fn set_failing(&self, fail: bool) {
            self.fail_reads.store(fail, Ordering::SeqCst);
        }

        fn fetches(&self, token: &str) -> usize {
            self.metadata_fetches
                .lock()
                .unwrap()
                .get(token)
                .copied()
                .unwrap_or(0)
        }
    }

    #[async_trait]
    impl ChainReader for MockReader {
        async fn read_reserves(&self, pool: &str, block: u64) -> anyhow::Result<(U256, U256)> {
            if self.fail_reads.load(Ordering::SeqCst) {
                anyhow::bail!("rpc unavailable");
            }
            self.pool_state
                .lock()
                .unwrap()
                .get(&(pool.to_string(), block))
                .map(|s| (s.reserve0, s.reserve1))
                .ok_or_else(|| anyhow::anyhow!("no pool state fixture for {pool}@{block}"))
        }

        async fn read_total_supply(&self, pool: &str, block: u64) -> anyhow::Result<U256> {
            if self.fail_reads.load(Ordering::SeqCst) {
                anyhow::bail!("rpc unavailable");
            }
            self.pool_state
                .lock()
                .unwrap()
                .get(&(pool.to_string(), block))
                .map(|s| s.total_supply)
                .ok_or_else(|| anyhow::anyhow!("no pool state fixture for {pool}@{block}"))
        }

        async fn read_token_metadata(
            &self,
            token: &str,
            _block: u64,
        ) -> anyhow::Result<TokenMetadata> {
            if self.fail_reads.load(Ordering::SeqCst) {
                anyhow::bail!("rpc unavailable");
            }
            *self
                .metadata_fetches
                .lock()
                .unwrap()
                .entry(token.to_string())
                .or_insert(0) += 1;
            self.metadata
                .lock()
                .unwrap()
                .get(token)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no metadata fixture for {token}"))
        }
    }

    fn meta(block: u64, timestamp: u64, tx_hash: &str, log_index: u32, address: &str) -> EventMeta {
        EventMeta {
            block_number: block,
            block_timestamp: timestamp,
            transaction_hash: tx_hash.to_string(),
            transaction_sender: SENDER.to_string(),
            log_index,
            address: address.to_string(),
        }
    }

    fn pool_created() -> PoolEvent {
        PoolEvent::PoolCreated {
            token0: WETH.to_string(),
            token1: USDC.to_string(),
            stable: false,
            pool: POOL.to_string(),
        }
    }

    fn swap(amount0_in: U256, amount1_out: U256) -> PoolEvent {
        PoolEvent::Swap {
            sender: SENDER.to_string(),
            to: RECIPIENT.to_string(),
            amount0_in,
            amount1_in: U256::ZERO,
            amount0_out: U256::ZERO,
            amount1_out,
        }
    }

    fn mint(amount0: U256, amount1: U256) -> PoolEvent {
        PoolEvent::Mint {
            sender: SENDER.to_string(),
            amount0,
            amount1,
        }
    }

    fn burn(amount0: U256, amount1: U256) -> PoolEvent {
        PoolEvent::Burn {
            sender: SENDER.to_string(),
            to: RECIPIENT.to_string(),
            amount0,
            amount1,
        }
    }

    fn setup() -> (Engine, Arc<MemoryStore>, Arc<MockReader>) {
        let store = Arc::new(MemoryStore::new());
        let reader = Arc::new(MockReader::new());
        let engine = Engine::new(store.clone(), reader.clone());
        (engine, store, reader)
    }

    async fn setup_with_pool() -> (Engine, Arc<MemoryStore>, Arc<MockReader>) {
        let (engine, store, reader) = setup();
        let outcome = engine
            .apply(&meta(100, T0, "0xtx-create", 0, FACTORY), &pool_created())
            .await
            .expect("pool creation");
        assert_eq!(outcome, Outcome::Applied);
        (engine, store, reader)
    }

    #[tokio::test]
    async fn test_pool_created_initializes_zeroed_state() {
        let (_, store, _) = setup_with_pool().await;

        let pool = store.get_pool(POOL).await.unwrap().expect("pool row");
        assert_eq!(pool.reserve0, U256::ZERO);
        assert_eq!(pool.reserve1, U256::ZERO);
        assert_eq!(pool.total_supply, U256::ZERO);
        assert_eq!(pool.ratio, "0");
        assert_eq!(pool.tx_count, 0);
        assert!(!pool.is_stable);
        assert_eq!(pool.created_at_block_number, 100);
        assert_eq!(pool.created_at_timestamp, T0);
        assert_eq!(pool.token0, WETH);
        assert_eq!(pool.token1, USDC);

        let token0 = store.get_token(WETH).await.unwrap().expect("token0 row");
        assert_eq!(token0.decimals, 18);
        assert_eq!(token0.symbol, "WETH");
        assert_eq!(token0.trade_volume, U256::ZERO);

        let token1 = store.get_token(USDC).await.unwrap().expect("token1 row");
        assert_eq!(token1.decimals, 6);
    }

    #[tokio::test]
    async fn test_pool_created_bumps_factory_counters() {
        let (engine, store, reader) = setup_with_pool().await;

        reader.add_token(DAI, "DAI", "Dai Stablecoin", 18, eth(5_000_000_000));
        let second = PoolEvent::PoolCreated {
            token0: WETH.to_string(),
            token1: DAI.to_string(),
            stable: true,
            pool: POOL_2.to_string(),
        };
        engine
            .apply(&meta(101, T0 + 10, "0xtx-create-2", 0, FACTORY), &second)
            .await
            .unwrap();

        let factory = store
            .get_factory(FACTORY)
            .await
            .unwrap()
            .expect("factory row");
        assert_eq!(factory.pool_count, 2);
        assert_eq!(factory.tx_count, 2);

        let pool2 = store.get_pool(POOL_2).await.unwrap().expect("second pool");
        assert!(pool2.is_stable);
    }

    #[tokio::test]
    async fn test_duplicate_pool_creation_is_a_hard_fault() {
        let (engine, _, _) = setup_with_pool().await;

        let err = engine
            .apply(&meta(105, T0 + 50, "0xtx-dup", 0, FACTORY), &pool_created())
            .await
            .expect_err("duplicate must fail");
        assert!(matches!(err, EngineError::DuplicatePool(id) if id == POOL));
    }

    #[tokio::test]
    async fn test_token_metadata_is_fetched_exactly_once() {
        let (engine, _, reader) = setup_with_pool().await;

        reader.add_token(DAI, "DAI", "Dai Stablecoin", 18, eth(5_000_000_000));
        let second = PoolEvent::PoolCreated {
            token0: WETH.to_string(),
            token1: DAI.to_string(),
            stable: false,
            pool: POOL_2.to_string(),
        };
        engine
            .apply(&meta(101, T0 + 10, "0xtx-create-2", 0, FACTORY), &second)
            .await
            .unwrap();

        // WETH is referenced by both pools but only fetched for the first.
        assert_eq!(reader.fetches(WETH), 1);
        assert_eq!(reader.fetches(USDC), 1);
        assert_eq!(reader.fetches(DAI), 1);
    }

    #[tokio::test]
    async fn test_unknown_pool_events_are_skipped() {
        let (engine, store, _) = setup_with_pool().await;

        let outcome = engine
            .apply(
                &meta(101, T0 + 5, "0xtx-foreign", 3, POOL_2),
                &swap(eth(1), usdc_units(1800)),
            )
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::UnknownPool);

        // Nothing was written for the skipped event.
        assert!(store.get_transaction("0xtx-foreign").await.unwrap().is_none());
        assert!(store.get_swap("0xtx-foreign-3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_swap_updates_pool_tokens_and_buckets() {
        let (engine, store, reader) = setup_with_pool().await;

        reader.set_pool_state(POOL, 101, eth(50), usdc_units(90_000), eth(2));
        engine
            .apply(
                &meta(101, T0 + 5, "0xtx-swap-1", 2, POOL),
                &swap(eth(1), usdc_units(1800)),
            )
            .await
            .unwrap();

        let pool = store.get_pool(POOL).await.unwrap().unwrap();
        assert_eq!(pool.reserve0, eth(50));
        assert_eq!(pool.reserve1, usdc_units(90_000));
        assert_eq!(pool.total_supply, eth(2));
        assert_eq!(pool.volume_token0, eth(1));
        assert_eq!(pool.volume_token1, usdc_units(1800));
        assert_eq!(pool.tx_count, 1);
        // 50 WETH / 90_000 USDC normalized to a common scale.
        assert_eq!(pool.ratio, "0.000555555555555555");

        let token0 = store.get_token(WETH).await.unwrap().unwrap();
        assert_eq!(token0.trade_volume, eth(1));
        assert_eq!(token0.tx_count, 1);

        let hour_start = bucket_start(T0 + 5, HOUR_SECONDS);
        let hour = store
            .get_pool_hour(&format!("{POOL}-{hour_start}"))
            .await
            .unwrap()
            .expect("hour bucket");
        assert_eq!(hour.hourly_volume_token0, eth(1));
        assert_eq!(hour.hourly_volume_token1, usdc_units(1800));
        assert_eq!(hour.hourly_tx_count, 1);
        assert_eq!(hour.reserve0, eth(50));

        let day_start = bucket_start(T0 + 5, DAY_SECONDS);
        let day = store
            .get_pool_day(&format!("{POOL}-{day_start}"))
            .await
            .unwrap()
            .expect("day bucket");
        assert_eq!(day.daily_volume_token0, eth(1));
        assert_eq!(day.token0, WETH);

        let token_day = store
            .get_token_day(&format!("{WETH}-{day_start}"))
            .await
            .unwrap()
            .expect("token day bucket");
        assert_eq!(token_day.daily_volume_token, eth(1));
        assert_eq!(token_day.daily_tx_count, 1);
    }

    #[tokio::test]
    async fn test_second_swap_in_same_hour_accumulates() {
        let (engine, store, reader) = setup_with_pool().await;

        reader.set_pool_state(POOL, 101, eth(50), usdc_units(90_000), eth(2));
        reader.set_pool_state(POOL, 102, eth(51), usdc_units(88_200), eth(2));

        engine
            .apply(
                &meta(101, T0 + 5, "0xtx-swap-1", 2, POOL),
                &swap(eth(1), usdc_units(1800)),
            )
            .await
            .unwrap();
        engine
            .apply(
                &meta(102, T0 + 60, "0xtx-swap-2", 1, POOL),
                &swap(eth(1), usdc_units(1795)),
            )
            .await
            .unwrap();

        let hour_start = bucket_start(T0 + 60, HOUR_SECONDS);
        assert_eq!(hour_start, bucket_start(T0 + 5, HOUR_SECONDS));

        let hour = store
            .get_pool_hour(&format!("{POOL}-{hour_start}"))
            .await
            .unwrap()
            .unwrap();
        // Volume and tx deltas accumulate; the snapshot is the latest write.
        assert_eq!(hour.hourly_volume_token0, eth(2));
        assert_eq!(hour.hourly_volume_token1, usdc_units(3595));
        assert_eq!(hour.hourly_tx_count, 2);
        assert_eq!(hour.reserve0, eth(51));
        assert_eq!(hour.reserve1, usdc_units(88_200));
    }

    #[tokio::test]
    async fn test_mint_tracks_liquidity_with_zero_volume() {
        let (engine, store, reader) = setup_with_pool().await;

        reader.set_pool_state(POOL, 101, eth(10), usdc_units(18_000), eth(1));
        engine
            .apply(
                &meta(101, T0 + 5, "0xtx-mint", 0, POOL),
                &mint(eth(10), usdc_units(18_000)),
            )
            .await
            .unwrap();

        let pool = store.get_pool(POOL).await.unwrap().unwrap();
        assert_eq!(pool.tx_count, 1);
        assert_eq!(pool.reserve0, eth(10));
        assert_eq!(pool.volume_token0, U256::ZERO);

        let token0 = store.get_token(WETH).await.unwrap().unwrap();
        assert_eq!(token0.total_liquidity, u256_to_bigint(eth(10)));
        assert_eq!(token0.total_liquidity_formatted, "10");
        assert_eq!(token0.trade_volume, U256::ZERO);
        assert_eq!(token0.tx_count, 1);

        let hour_start = bucket_start(T0 + 5, HOUR_SECONDS);
        let hour = store
            .get_pool_hour(&format!("{POOL}-{hour_start}"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hour.hourly_volume_token0, U256::ZERO);
        assert_eq!(hour.hourly_tx_count, 1);
        assert_eq!(hour.reserve0, eth(10));

        let mint_row = store.get_mint("0xtx-mint-0").await.unwrap().expect("mint row");
        assert_eq!(mint_row.amount0_formatted, "10");
        assert_eq!(mint_row.to, SENDER);
    }

    #[tokio::test]
    async fn test_burn_can_drive_token_liquidity_negative() {
        let (engine, store, reader) = setup_with_pool().await;

        // Burn processed without the funding mint: the running liquidity
        // total goes negative and must not clamp or panic.
        reader.set_pool_state(POOL, 101, U256::ZERO, U256::ZERO, U256::ZERO);
        engine
            .apply(
                &meta(101, T0 + 5, "0xtx-burn", 0, POOL),
                &burn(eth(3), usdc_units(5_400)),
            )
            .await
            .unwrap();

        let token0 = store.get_token(WETH).await.unwrap().unwrap();
        assert_eq!(token0.total_liquidity, -u256_to_bigint(eth(3)));
        assert_eq!(token0.total_liquidity_formatted, "-3");

        let token1 = store.get_token(USDC).await.unwrap().unwrap();
        assert_eq!(token1.total_liquidity_formatted, "-5400");

        let day_start = bucket_start(T0 + 5, DAY_SECONDS);
        let token_day = store
            .get_token_day(&format!("{WETH}-{day_start}"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(token_day.total_liquidity_token, -u256_to_bigint(eth(3)));
    }

    #[tokio::test]
    async fn test_pool_tx_count_matches_applied_events() {
        let (engine, store, reader) = setup_with_pool().await;

        for block in 101..=105u64 {
            reader.set_pool_state(POOL, block, eth(block), usdc_units(1_000), eth(1));
        }

        engine
            .apply(&meta(101, T0 + 1, "0xtx-a", 0, POOL), &swap(eth(1), usdc_units(10)))
            .await
            .unwrap();
        engine
            .apply(&meta(102, T0 + 2, "0xtx-b", 0, POOL), &mint(eth(1), usdc_units(10)))
            .await
            .unwrap();
        engine
            .apply(&meta(103, T0 + 3, "0xtx-c", 0, POOL), &burn(eth(1), usdc_units(10)))
            .await
            .unwrap();
        engine
            .apply(&meta(104, T0 + 4, "0xtx-d", 0, POOL), &swap(eth(2), usdc_units(20)))
            .await
            .unwrap();
        // Unknown-pool event between real ones does not count.
        let skipped = engine
            .apply(&meta(104, T0 + 4, "0xtx-d", 1, POOL_2), &swap(eth(2), usdc_units(20)))
            .await
            .unwrap();
        assert_eq!(skipped, Outcome::UnknownPool);
        engine
            .apply(&meta(105, T0 + 5, "0xtx-e", 0, POOL), &burn(eth(1), usdc_units(10)))
            .await
            .unwrap();

        let pool = store.get_pool(POOL).await.unwrap().unwrap();
        assert_eq!(pool.tx_count, 5);
    }

    #[tokio::test]
    async fn test_failed_chain_read_leaves_no_partial_state() {
        let (engine, store, reader) = setup_with_pool().await;

        reader.set_failing(true);
        let err = engine
            .apply(
                &meta(101, T0 + 5, "0xtx-fail", 0, POOL),
                &swap(eth(1), usdc_units(1800)),
            )
            .await
            .expect_err("read failure must surface");
        assert!(matches!(err, EngineError::ExternalRead { .. }));

        // The event was discarded atomically: no counters moved, no rows
        // were written.
        let pool = store.get_pool(POOL).await.unwrap().unwrap();
        assert_eq!(pool.tx_count, 0);
        assert_eq!(pool.volume_token0, U256::ZERO);
        assert!(store.get_transaction("0xtx-fail").await.unwrap().is_none());
        assert!(store.get_swap("0xtx-fail-0").await.unwrap().is_none());

        let hour_start = bucket_start(T0 + 5, HOUR_SECONDS);
        assert!(store
            .get_pool_hour(&format!("{POOL}-{hour_start}"))
            .await
            .unwrap()
            .is_none());

        // The same event succeeds once the collaborator recovers.
        reader.set_failing(false);
        reader.set_pool_state(POOL, 101, eth(50), usdc_units(90_000), eth(2));
        engine
            .apply(
                &meta(101, T0 + 5, "0xtx-fail", 0, POOL),
                &swap(eth(1), usdc_units(1800)),
            )
            .await
            .unwrap();
        let pool = store.get_pool(POOL).await.unwrap().unwrap();
        assert_eq!(pool.tx_count, 1);
    }

    #[tokio::test]
    async fn test_out_of_order_delivery_leaves_stale_reserve_snapshot() {
        let (engine, store, reader) = setup_with_pool().await;

        reader.set_pool_state(POOL, 101, eth(50), usdc_units(90_000), eth(2));
        reader.set_pool_state(POOL, 102, eth(51), usdc_units(88_200), eth(2));

        // Chain order violated: block 102 applied before block 101.
        engine
            .apply(
                &meta(102, T0 + 60, "0xtx-late", 0, POOL),
                &swap(eth(1), usdc_units(1795)),
            )
            .await
            .unwrap();
        engine
            .apply(
                &meta(101, T0 + 5, "0xtx-early", 0, POOL),
                &swap(eth(1), usdc_units(1800)),
            )
            .await
            .unwrap();

        // Last write wins, so the pool is stuck at block 101's snapshot
        // instead of the true latest state from block 102. This mismatch is
        // the detectable invariant violation that the ordering requirement
        // exists to prevent.
        let pool = store.get_pool(POOL).await.unwrap().unwrap();
        assert_eq!(pool.reserve0, eth(50));
        assert_ne!(pool.reserve0, eth(51));
    }

    #[tokio::test]
    async fn test_logs_sharing_a_transaction_write_one_transaction_row() {
        let (engine, store, reader) = setup_with_pool().await;

        reader.set_pool_state(POOL, 101, eth(50), usdc_units(90_000), eth(2));
        engine
            .apply(
                &meta(101, T0 + 5, "0xtx-multi", 0, POOL),
                &swap(eth(1), usdc_units(1800)),
            )
            .await
            .unwrap();
        engine
            .apply(
                &meta(101, T0 + 5, "0xtx-multi", 1, POOL),
                &swap(eth(2), usdc_units(3600)),
            )
            .await
            .unwrap();

        let tx = store
            .get_transaction("0xtx-multi")
            .await
            .unwrap()
            .expect("transaction row");
        assert_eq!(tx.block_number, 101);

        // Both log rows exist, keyed by (tx, log index).
        assert!(store.get_swap("0xtx-multi-0").await.unwrap().is_some());
        assert!(store.get_swap("0xtx-multi-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_swap_row_captures_formatted_amounts() {
        let (engine, store, reader) = setup_with_pool().await;

        reader.set_pool_state(POOL, 101, eth(50), usdc_units(90_000), eth(2));
        engine
            .apply(
                &meta(101, T0 + 5, "0xTX-Case", 4, POOL),
                &swap(eth(1), usdc_units(1800)),
            )
            .await
            .unwrap();

        let row = store
            .get_swap("0xtx-case-4")
            .await
            .unwrap()
            .expect("swap row keyed by lowercased tx hash");
        assert_eq!(row.amount0_in_formatted, "1");
        assert_eq!(row.amount1_out_formatted, "1800");
        assert_eq!(row.amount1_in_formatted, "0");
        assert_eq!(row.from, SENDER);
        assert_eq!(row.to, RECIPIENT);
    }
}

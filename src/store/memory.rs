//! In-memory entity store.
//!
//! Table-per-entity maps behind a single async mutex, which makes every
//! trait call atomic and gives read-your-writes within the processing
//! loop. Used by the binary and as the test fixture; a persistent store
//! implements the same [`EntityStore`] trait.

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::sync::Mutex;

use crate::store::models::{
    Burn, Factory, Mint, Pool, PoolDayData, PoolHourData, Swap, Token, TokenDayData, Transaction,
};
use crate::store::{EntityStore, Merge, StoreError};

#[derive(Default)]
struct Tables {
    factories: FxHashMap<String, Factory>,
    tokens: FxHashMap<String, Token>,
    pools: FxHashMap<String, Pool>,
    pool_hours: FxHashMap<String, PoolHourData>,
    pool_days: FxHashMap<String, PoolDayData>,
    token_days: FxHashMap<String, TokenDayData>,
    transactions: FxHashMap<String, Transaction>,
    swaps: FxHashMap<String, Swap>,
    mints: FxHashMap<String, Mint>,
    burns: FxHashMap<String, Burn>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows across all tables; handy for progress logging.
    pub async fn row_count(&self) -> usize {
        let t = self.tables.lock().await;
        t.factories.len()
            + t.tokens.len()
            + t.pools.len()
            + t.pool_hours.len()
            + t.pool_days.len()
            + t.token_days.len()
            + t.transactions.len()
            + t.swaps.len()
            + t.mints.len()
            + t.burns.len()
    }
}

fn create_row<T: Clone>(
    table: &mut FxHashMap<String, T>,
    kind: &'static str,
    id: String,
    row: T,
) -> Result<T, StoreError> {
    if table.contains_key(&id) {
        return Err(StoreError::Conflict { kind, id });
    }
    table.insert(id, row.clone());
    Ok(row)
}

fn update_row<T>(
    table: &mut FxHashMap<String, T>,
    kind: &'static str,
    id: String,
    row: T,
) -> Result<(), StoreError> {
    if !table.contains_key(&id) {
        return Err(StoreError::NotFound { kind, id });
    }
    table.insert(id, row);
    Ok(())
}

fn upsert_row<T: Clone>(
    table: &mut FxHashMap<String, T>,
    id: String,
    seed: T,
    merge: Merge<T>,
) -> T {
    let row = table.entry(id).or_insert(seed);
    merge(row);
    row.clone()
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get_factory(&self, id: &str) -> Result<Option<Factory>, StoreError> {
        Ok(self.tables.lock().await.factories.get(id).cloned())
    }

    async fn upsert_factory(
        &self,
        seed: Factory,
        merge: Merge<Factory>,
    ) -> Result<Factory, StoreError> {
        let mut t = self.tables.lock().await;
        Ok(upsert_row(&mut t.factories, seed.id.clone(), seed, merge))
    }

    async fn get_token(&self, id: &str) -> Result<Option<Token>, StoreError> {
        Ok(self.tables.lock().await.tokens.get(id).cloned())
    }

    async fn create_token(&self, row: Token) -> Result<Token, StoreError> {
        let mut t = self.tables.lock().await;
        create_row(&mut t.tokens, "Token", row.id.clone(), row)
    }

    async fn update_token(&self, row: Token) -> Result<(), StoreError> {
        let mut t = self.tables.lock().await;
        update_row(&mut t.tokens, "Token", row.id.clone(), row)
    }

    async fn get_pool(&self, id: &str) -> Result<Option<Pool>, StoreError> {
        Ok(self.tables.lock().await.pools.get(id).cloned())
    }

    async fn create_pool(&self, row: Pool) -> Result<Pool, StoreError> {
        let mut t = self.tables.lock().await;
        create_row(&mut t.pools, "Pool", row.id.clone(), row)
    }

    async fn update_pool(&self, row: Pool) -> Result<(), StoreError> {
        let mut t = self.tables.lock().await;
        update_row(&mut t.pools, "Pool", row.id.clone(), row)
    }

    async fn get_pool_hour(&self, id: &str) -> Result<Option<PoolHourData>, StoreError> {
        Ok(self.tables.lock().await.pool_hours.get(id).cloned())
    }

    async fn upsert_pool_hour(
        &self,
        seed: PoolHourData,
        merge: Merge<PoolHourData>,
    ) -> Result<PoolHourData, StoreError> {
        let mut t = self.tables.lock().await;
        Ok(upsert_row(&mut t.pool_hours, seed.id.clone(), seed, merge))
    }

    async fn get_pool_day(&self, id: &str) -> Result<Option<PoolDayData>, StoreError> {
        Ok(self.tables.lock().await.pool_days.get(id).cloned())
    }

    async fn upsert_pool_day(
        &self,
        seed: PoolDayData,
        merge: Merge<PoolDayData>,
    ) -> Result<PoolDayData, StoreError> {
        let mut t = self.tables.lock().await;
        Ok(upsert_row(&mut t.pool_days, seed.id.clone(), seed, merge))
    }

    async fn get_token_day(&self, id: &str) -> Result<Option<TokenDayData>, StoreError> {
        Ok(self.tables.lock().await.token_days.get(id).cloned())
    }

    async fn upsert_token_day(
        &self,
        seed: TokenDayData,
        merge: Merge<TokenDayData>,
    ) -> Result<TokenDayData, StoreError> {
        let mut t = self.tables.lock().await;
        Ok(upsert_row(&mut t.token_days, seed.id.clone(), seed, merge))
    }

    async fn get_transaction(&self, id: &str) -> Result<Option<Transaction>, StoreError> {
        Ok(self.tables.lock().await.transactions.get(id).cloned())
    }

    async fn upsert_transaction(&self, row: Transaction) -> Result<(), StoreError> {
        let mut t = self.tables.lock().await;
        t.transactions.insert(row.id.clone(), row);
        Ok(())
    }

    async fn get_swap(&self, id: &str) -> Result<Option<Swap>, StoreError> {
        Ok(self.tables.lock().await.swaps.get(id).cloned())
    }

    async fn insert_swap(&self, row: Swap) -> Result<(), StoreError> {
        let mut t = self.tables.lock().await;
        create_row(&mut t.swaps, "Swap", row.id.clone(), row)?;
        Ok(())
    }

    async fn get_mint(&self, id: &str) -> Result<Option<Mint>, StoreError> {
        Ok(self.tables.lock().await.mints.get(id).cloned())
    }

    async fn insert_mint(&self, row: Mint) -> Result<(), StoreError> {
        let mut t = self.tables.lock().await;
        create_row(&mut t.mints, "Mint", row.id.clone(), row)?;
        Ok(())
    }

    async fn get_burn(&self, id: &str) -> Result<Option<Burn>, StoreError> {
        Ok(self.tables.lock().await.burns.get(id).cloned())
    }

    async fn insert_burn(&self, row: Burn) -> Result<(), StoreError> {
        let mut t = self.tables.lock().await;
        create_row(&mut t.burns, "Burn", row.id.clone(), row)?;
        Ok(())
    }
}

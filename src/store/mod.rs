//! Entity store adapter.
//!
//! The persistent storage engine is an external collaborator; the engine
//! only consumes the [`EntityStore`] interface. Each call is atomic and
//! fails distinctly on "not found" vs. "already exists" vs. transport
//! errors, and the upsert methods apply their merge closure under the
//! store's atomicity so create-if-absent counters never race.

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod models;

pub use memory::MemoryStore;

use models::{
    Burn, Factory, Mint, Pool, PoolDayData, PoolHourData, Swap, Token, TokenDayData, Transaction,
};

/// Merge closure applied under the store's atomic upsert primitive.
pub type Merge<T> = Box<dyn FnOnce(&mut T) + Send>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("{kind} already exists: {id}")]
    Conflict { kind: &'static str, id: String },
    #[error("store transport failure: {0}")]
    Transport(String),
}

/// Keyed get/create/update of typed entity rows.
///
/// Implementations must give per-key read-your-writes consistency within
/// one processing unit: a row written by one call is visible to the next.
/// `create_*` fails with [`StoreError::Conflict`] when the row exists;
/// `update_*` fails with [`StoreError::NotFound`] when it does not.
/// `upsert_*` inserts the seed row when absent, then applies the merge
/// closure and returns the post-merge row — atomically per call.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get_factory(&self, id: &str) -> Result<Option<Factory>, StoreError>;
    async fn upsert_factory(&self, seed: Factory, merge: Merge<Factory>)
        -> Result<Factory, StoreError>;

    async fn get_token(&self, id: &str) -> Result<Option<Token>, StoreError>;
    async fn create_token(&self, row: Token) -> Result<Token, StoreError>;
    async fn update_token(&self, row: Token) -> Result<(), StoreError>;

    async fn get_pool(&self, id: &str) -> Result<Option<Pool>, StoreError>;
    async fn create_pool(&self, row: Pool) -> Result<Pool, StoreError>;
    async fn update_pool(&self, row: Pool) -> Result<(), StoreError>;

    async fn get_pool_hour(&self, id: &str) -> Result<Option<PoolHourData>, StoreError>;
    async fn upsert_pool_hour(
        &self,
        seed: PoolHourData,
        merge: Merge<PoolHourData>,
    ) -> Result<PoolHourData, StoreError>;
    async fn get_pool_day(&self, id: &str) -> Result<Option<PoolDayData>, StoreError>;
    async fn upsert_pool_day(
        &self,
        seed: PoolDayData,
        merge: Merge<PoolDayData>,
    ) -> Result<PoolDayData, StoreError>;
    async fn get_token_day(&self, id: &str) -> Result<Option<TokenDayData>, StoreError>;
    async fn upsert_token_day(
        &self,
        seed: TokenDayData,
        merge: Merge<TokenDayData>,
    ) -> Result<TokenDayData, StoreError>;

    async fn get_transaction(&self, id: &str) -> Result<Option<Transaction>, StoreError>;
    /// Idempotent: re-processing further logs of the same transaction
    /// overwrites the row instead of erroring.
    async fn upsert_transaction(&self, row: Transaction) -> Result<(), StoreError>;

    async fn get_swap(&self, id: &str) -> Result<Option<Swap>, StoreError>;
    async fn insert_swap(&self, row: Swap) -> Result<(), StoreError>;
    async fn get_mint(&self, id: &str) -> Result<Option<Mint>, StoreError>;
    async fn insert_mint(&self, row: Mint) -> Result<(), StoreError>;
    async fn get_burn(&self, id: &str) -> Result<Option<Burn>, StoreError>;
    async fn insert_burn(&self, row: Burn) -> Result<(), StoreError>;
}

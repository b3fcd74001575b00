//! Chain-side collaborators: the ordered event feed types and the
//! block-scoped read interface the engine consumes.

use alloy::primitives::U256;
use async_trait::async_trait;

pub mod feed;
pub mod rpc;

pub use feed::{EventMeta, FeedRecord, PoolEvent};
pub use rpc::RpcChainReader;

/// ERC-20 metadata read from the chain when a token is first referenced.
#[derive(Debug, Clone)]
pub struct TokenMetadata {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub total_supply: U256,
}

/// Point-in-time contract reads pinned to the block of the triggering
/// event. Each call reflects state as of `block`, not the chain tip.
///
/// Timeout and retry policy belong to the implementation; the engine only
/// propagates failures.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn read_reserves(&self, pool: &str, block: u64) -> anyhow::Result<(U256, U256)>;
    async fn read_total_supply(&self, pool: &str, block: u64) -> anyhow::Result<U256>;
    async fn read_token_metadata(&self, token: &str, block: u64) -> anyhow::Result<TokenMetadata>;
}

use serde::Serialize;

/// Aggregate counters for one pool factory contract (one row per factory).
///
/// Created lazily on the first PoolCreated event and only ever incremented
/// afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Factory {
    pub id: String,
    pub pool_count: u64,
    pub tx_count: u64,
}

impl Factory {
    pub fn new(address: &str) -> Self {
        Self {
            // Always lowercase addresses for consistent comparisons
            id: address.to_lowercase(),
            pool_count: 0,
            tx_count: 0,
        }
    }
}

use thiserror::Error;

use crate::store::StoreError;

/// Failures surfaced while applying one feed event.
///
/// An unknown pool on swap/mint/burn is deliberately NOT represented here:
/// those events are skipped silently (see `engine::Outcome`), while a
/// duplicate pool creation is a hard fault. The asymmetry is intentional.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A factory announced a pool address that already has a row. This
    /// points at a corrupted or replayed feed and must never be absorbed
    /// silently.
    #[error("duplicate pool creation: {0}")]
    DuplicatePool(String),

    /// A block-scoped chain read failed. The event's mutations were
    /// discarded; the ingestion layer must retry the event before
    /// advancing past it, or the state diverges permanently.
    #[error("chain read failed ({context}): {source}")]
    ExternalRead {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

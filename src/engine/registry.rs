//! Token registry: each token address gets its metadata fetched exactly
//! once, on first reference from a pool-creation event.

use std::sync::Arc;

use crate::chain::ChainReader;
use crate::error::EngineError;
use crate::store::{models::Token, EntityStore, StoreError};

#[derive(Clone)]
pub struct TokenRegistry {
    store: Arc<dyn EntityStore>,
    reader: Arc<dyn ChainReader>,
}

impl TokenRegistry {
    pub fn new(store: Arc<dyn EntityStore>, reader: Arc<dyn ChainReader>) -> Self {
        Self { store, reader }
    }

    /// Return the Token row for `address`, fetching metadata and creating
    /// the row if this is the first reference.
    ///
    /// Idempotent under concurrent calls: losing a create race is resolved
    /// by re-reading the winner's row, never by erroring. A failed
    /// metadata read is fatal to the enclosing event.
    pub async fn ensure_token(&self, address: &str, block: u64) -> Result<Token, EngineError> {
        let id = address.to_lowercase();

        if let Some(token) = self.store.get_token(&id).await? {
            return Ok(token);
        }

        let metadata = self
            .reader
            .read_token_metadata(&id, block)
            .await
            .map_err(|source| EngineError::ExternalRead {
                context: format!("token metadata for {id}"),
                source,
            })?;

        match self.store.create_token(Token::new(&id, metadata)).await {
            Ok(created) => Ok(created),
            // Lost the create race; the winner's row is canonical.
            Err(StoreError::Conflict { .. }) => {
                let winner = self.store.get_token(&id).await?.ok_or(StoreError::NotFound {
                    kind: "Token",
                    id: id.clone(),
                })?;
                Ok(winner)
            },
            Err(e) => Err(e.into()),
        }
    }
}

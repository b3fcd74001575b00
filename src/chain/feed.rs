//! Decoded event feed delivered by the external sync layer.
//!
//! The sync collaborator guarantees delivery in non-decreasing
//! (block number, log index) order; the engine relies on that ordering
//! and does not reorder or deduplicate.

use alloy::primitives::{LogData, U256};
use alloy::sol_types::SolEvent;
use serde::{Deserialize, Serialize};

use crate::abis::{factory, pool};
use crate::utils::hex_encode;

/// Per-event envelope: block, transaction and log coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMeta {
    pub block_number: u64,
    pub block_timestamp: u64,
    pub transaction_hash: String,
    pub transaction_sender: String,
    pub log_index: u32,
    /// Emitting contract: the factory for PoolCreated, the pool otherwise.
    pub address: String,
}

/// Decoded event arguments, one variant per tracked event kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PoolEvent {
    PoolCreated {
        token0: String,
        token1: String,
        stable: bool,
        pool: String,
    },
    Swap {
        sender: String,
        to: String,
        amount0_in: U256,
        amount1_in: U256,
        amount0_out: U256,
        amount1_out: U256,
    },
    Mint {
        sender: String,
        amount0: U256,
        amount1: U256,
    },
    Burn {
        sender: String,
        to: String,
        amount0: U256,
        amount1: U256,
    },
}

/// One feed line: envelope plus decoded arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedRecord {
    pub meta: EventMeta,
    pub event: PoolEvent,
}

impl PoolEvent {
    /// Decode a raw log into a feed event by topic0. Returns `None` for
    /// logs this engine does not track.
    pub fn decode(log_data: &LogData) -> Option<Self> {
        let topic0 = log_data.topics().first()?;

        match *topic0 {
            t if t == factory::PoolCreated::SIGNATURE_HASH => {
                let event = factory::PoolCreated::decode_log_data(log_data).ok()?;
                Some(Self::PoolCreated {
                    token0: hex_encode(event.token0.as_slice()),
                    token1: hex_encode(event.token1.as_slice()),
                    stable: event.stable,
                    pool: hex_encode(event.pool.as_slice()),
                })
            },
            t if t == pool::Swap::SIGNATURE_HASH => {
                let event = pool::Swap::decode_log_data(log_data).ok()?;
                Some(Self::Swap {
                    sender: hex_encode(event.sender.as_slice()),
                    to: hex_encode(event.to.as_slice()),
                    amount0_in: event.amount0In,
                    amount1_in: event.amount1In,
                    amount0_out: event.amount0Out,
                    amount1_out: event.amount1Out,
                })
            },
            t if t == pool::Mint::SIGNATURE_HASH => {
                let event = pool::Mint::decode_log_data(log_data).ok()?;
                Some(Self::Mint {
                    sender: hex_encode(event.sender.as_slice()),
                    amount0: event.amount0,
                    amount1: event.amount1,
                })
            },
            t if t == pool::Burn::SIGNATURE_HASH => {
                let event = pool::Burn::decode_log_data(log_data).ok()?;
                Some(Self::Burn {
                    sender: hex_encode(event.sender.as_slice()),
                    to: hex_encode(event.to.as_slice()),
                    amount0: event.amount0,
                    amount1: event.amount1,
                })
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, IntoLogData, U256};

    #[test]
    fn test_decode_swap_log() {
        let sender = Address::repeat_byte(0x11);
        let to = Address::repeat_byte(0x22);
        let raw = pool::Swap {
            sender,
            to,
            amount0In: U256::from(1000u64),
            amount1In: U256::ZERO,
            amount0Out: U256::ZERO,
            amount1Out: U256::from(500u64),
        };

        let decoded = PoolEvent::decode(&raw.into_log_data()).expect("tracked event");
        match decoded {
            PoolEvent::Swap {
                amount0_in,
                amount1_out,
                ..
            } => {
                assert_eq!(amount0_in, U256::from(1000u64));
                assert_eq!(amount1_out, U256::from(500u64));
            },
            other => panic!("decoded wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_decode_ignores_untracked_topics() {
        let log_data = LogData::new_unchecked(vec![], Default::default());
        assert!(PoolEvent::decode(&log_data).is_none());
    }
}

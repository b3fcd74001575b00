use alloy::primitives::U256;
use serde::Serialize;

use crate::chain::feed::EventMeta;
use crate::store::models::{Pool, Token};
use crate::utils::format_u256;

/// One row per chain transaction, keyed by the transaction hash.
///
/// Multiple logs in the same transaction write the same row; the store
/// upserts it idempotently (last write wins, matching upstream behavior).
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: String,
    pub block_number: u64,
    pub timestamp: u64,
}

impl Transaction {
    pub fn new(meta: &EventMeta) -> Self {
        Self {
            id: meta.transaction_hash.to_lowercase(),
            block_number: meta.block_number,
            timestamp: meta.block_timestamp,
        }
    }
}

fn log_id(meta: &EventMeta) -> String {
    format!("{}-{}", meta.transaction_hash.to_lowercase(), meta.log_index)
}

/// Immutable swap log record, keyed by `"{tx_hash}-{log_index}"`.
#[derive(Debug, Clone, Serialize)]
pub struct Swap {
    pub id: String,
    pub transaction: String,
    pub timestamp: u64,
    pub pool: String,
    pub sender: String,
    pub from: String,
    pub to: String,
    pub amount0_in: U256,
    pub amount0_in_formatted: String,
    pub amount1_in: U256,
    pub amount1_in_formatted: String,
    pub amount0_out: U256,
    pub amount0_out_formatted: String,
    pub amount1_out: U256,
    pub amount1_out_formatted: String,
}

impl Swap {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        meta: &EventMeta,
        pool: &Pool,
        token0: &Token,
        token1: &Token,
        sender: &str,
        to: &str,
        amount0_in: U256,
        amount1_in: U256,
        amount0_out: U256,
        amount1_out: U256,
    ) -> Self {
        Self {
            id: log_id(meta),
            transaction: meta.transaction_hash.to_lowercase(),
            timestamp: meta.block_timestamp,
            pool: pool.id.clone(),
            sender: sender.to_lowercase(),
            from: meta.transaction_sender.to_lowercase(),
            to: to.to_lowercase(),
            amount0_in_formatted: format_u256(amount0_in, token0.decimals),
            amount0_in,
            amount1_in_formatted: format_u256(amount1_in, token1.decimals),
            amount1_in,
            amount0_out_formatted: format_u256(amount0_out, token0.decimals),
            amount0_out,
            amount1_out_formatted: format_u256(amount1_out, token1.decimals),
            amount1_out,
        }
    }
}

/// Immutable mint log record, keyed by `"{tx_hash}-{log_index}"`.
#[derive(Debug, Clone, Serialize)]
pub struct Mint {
    pub id: String,
    pub transaction: String,
    pub timestamp: u64,
    pub pool: String,
    pub sender: String,
    pub amount0: U256,
    pub amount0_formatted: String,
    pub amount1: U256,
    pub amount1_formatted: String,
    pub to: String,
}

impl Mint {
    pub fn new(
        meta: &EventMeta,
        pool: &Pool,
        token0: &Token,
        token1: &Token,
        sender: &str,
        amount0: U256,
        amount1: U256,
    ) -> Self {
        Self {
            id: log_id(meta),
            transaction: meta.transaction_hash.to_lowercase(),
            timestamp: meta.block_timestamp,
            pool: pool.id.clone(),
            sender: sender.to_lowercase(),
            amount0_formatted: format_u256(amount0, token0.decimals),
            amount0,
            amount1_formatted: format_u256(amount1, token1.decimals),
            amount1,
            // The pool emits no recipient on Mint; the sender is the recipient.
            to: sender.to_lowercase(),
        }
    }
}

/// Immutable burn log record, keyed by `"{tx_hash}-{log_index}"`.
#[derive(Debug, Clone, Serialize)]
pub struct Burn {
    pub id: String,
    pub transaction: String,
    pub timestamp: u64,
    pub pool: String,
    pub sender: String,
    pub amount0: U256,
    pub amount0_formatted: String,
    pub amount1: U256,
    pub amount1_formatted: String,
    pub to: String,
}

impl Burn {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        meta: &EventMeta,
        pool: &Pool,
        token0: &Token,
        token1: &Token,
        sender: &str,
        to: &str,
        amount0: U256,
        amount1: U256,
    ) -> Self {
        Self {
            id: log_id(meta),
            transaction: meta.transaction_hash.to_lowercase(),
            timestamp: meta.block_timestamp,
            pool: pool.id.clone(),
            sender: sender.to_lowercase(),
            amount0_formatted: format_u256(amount0, token0.decimals),
            amount0,
            amount1_formatted: format_u256(amount1, token1.decimals),
            amount1,
            to: to.to_lowercase(),
        }
    }
}

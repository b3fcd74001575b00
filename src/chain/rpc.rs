//! JSON-RPC implementation of [`ChainReader`].
//!
//! Every read is pinned to the triggering event's block so the engine
//! sees contract state as of that block, not the chain tip.

use std::time::Duration;

use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, ProviderBuilder};
use anyhow::{Context, Result};
use async_trait::async_trait;
use url::Url;

use crate::abis::{IPool, IERC20};
use crate::chain::{ChainReader, TokenMetadata};

pub struct RpcChainReader {
    provider: DynProvider,
    call_timeout: Duration,
}

impl RpcChainReader {
    pub fn new(rpc_url: &str, call_timeout: Duration) -> Result<Self> {
        let url = Url::parse(rpc_url).context("Invalid RPC URL")?;

        let client = ProviderBuilder::new().connect_http(url);

        Ok(Self {
            provider: DynProvider::new(client),
            call_timeout,
        })
    }

    fn parse_address(value: &str) -> Result<Address> {
        value
            .parse()
            .with_context(|| format!("Invalid contract address: {value}"))
    }
}

#[async_trait]
impl ChainReader for RpcChainReader {
    async fn read_reserves(&self, pool: &str, block: u64) -> Result<(U256, U256)> {
        let address = Self::parse_address(pool)?;
        let contract = IPool::new(address, &self.provider);

        let call = contract.getReserves().block(block.into());
        let reserves = tokio::time::timeout(self.call_timeout, call.call())
            .await
            .context("getReserves timeout")?
            .with_context(|| format!("getReserves failed for pool {pool}"))?;

        Ok((reserves.reserve0, reserves.reserve1))
    }

    async fn read_total_supply(&self, pool: &str, block: u64) -> Result<U256> {
        let address = Self::parse_address(pool)?;
        let contract = IPool::new(address, &self.provider);

        let call = contract.totalSupply().block(block.into());
        let supply = tokio::time::timeout(self.call_timeout, call.call())
            .await
            .context("totalSupply timeout")?
            .with_context(|| format!("totalSupply failed for pool {pool}"))?;

        Ok(supply)
    }

    async fn read_token_metadata(&self, token: &str, block: u64) -> Result<TokenMetadata> {
        let address = Self::parse_address(token)?;
        let contract = IERC20::new(address, &self.provider);

        // Decimals and supply are required; a token without them cannot be
        // aggregated and fails the enclosing event.
        let decimals_call = contract.decimals().block(block.into());
        let decimals = tokio::time::timeout(self.call_timeout, decimals_call.call())
            .await
            .context("decimals timeout")?
            .with_context(|| format!("decimals failed for token {token}"))?;

        let supply_call = contract.totalSupply().block(block.into());
        let total_supply = tokio::time::timeout(self.call_timeout, supply_call.call())
            .await
            .context("totalSupply timeout")?
            .with_context(|| format!("totalSupply failed for token {token}"))?;

        // Name and symbol are optional; plenty of live tokens revert on one
        // or the other.
        let name_call = contract.name().block(block.into());
        let name = tokio::time::timeout(self.call_timeout, name_call.call())
            .await
            .ok()
            .and_then(|r| r.ok())
            .unwrap_or_default();

        let symbol_call = contract.symbol().block(block.into());
        let symbol = tokio::time::timeout(self.call_timeout, symbol_call.call())
            .await
            .ok()
            .and_then(|r| r.ok())
            .unwrap_or_default();

        Ok(TokenMetadata {
            symbol,
            name,
            decimals,
            total_supply,
        })
    }
}

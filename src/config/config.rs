use config::{Config, ConfigError, File};
use serde::Deserialize;

/// JSON-RPC endpoint configuration.
///
/// Used for block-scoped contract reads (pool reserves, LP supply and
/// ERC-20 metadata) triggered by feed events.
#[derive(Debug, Deserialize, Clone)]
pub struct RpcSettings {
    pub url: String,
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

fn default_call_timeout_secs() -> u64 {
    30
}

/// Feed processing configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct IndexerSettings {
    /// Factory contract whose PoolCreated events are tracked. Creations
    /// from any other factory are dropped before dispatch.
    pub factory_address: String,
    #[serde(default = "default_progress_interval_secs")]
    pub progress_interval_secs: u64,
}

fn default_progress_interval_secs() -> u64 {
    10
}

/// Root application configuration.
///
/// Loaded from `config.yaml` at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub rpc: RpcSettings,
    pub indexer: IndexerSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        Ok(settings)
    }
}

mod config;

pub use config::{IndexerSettings, RpcSettings, Settings};

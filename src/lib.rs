pub mod abis;
pub mod chain;
pub mod config;
pub mod engine;
pub mod error;
pub mod store;
pub mod utils;

pub use chain::{ChainReader, RpcChainReader};
pub use config::Settings;
pub use engine::{Engine, Outcome};
pub use error::EngineError;
pub use store::{EntityStore, MemoryStore};

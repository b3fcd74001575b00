pub mod erc20;
pub mod factory;
pub mod pool;

pub use erc20::IERC20;
pub use factory::PoolCreated;
pub use pool::{Burn, IPool, Mint, Swap};

pub mod events;
pub mod factory;
pub mod pool;
pub mod rollup;
pub mod token;

pub use events::{Burn, Mint, Swap, Transaction};
pub use factory::Factory;
pub use pool::{Pool, LP_TOKEN_DECIMALS};
pub use rollup::{PoolDayData, PoolHourData, ReserveSnapshot, TokenDayData};
pub use token::Token;

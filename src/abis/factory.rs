use alloy::sol;

sol! {
    event PoolCreated(address indexed token0, address indexed token1, bool indexed stable, address pool, uint256);
}

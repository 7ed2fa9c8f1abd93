//! Ref Swap Constants
//!
//! Gas budgets, deposits and math parameters for Ref Finance pools.

/// Gas attached to each generated call
pub mod gas {
    use near_tx::tgas;
    use refhat_core::Gas;

    /// `ft_transfer_call` into the exchange (covers a multi-hop swap)
    pub const FT_TRANSFER_CALL: Gas = tgas(180);

    /// `storage_deposit` registration on a token contract
    pub const STORAGE_DEPOSIT: Gas = tgas(30);

    /// `near_deposit` / `near_withdraw` on the wrapped NEAR contract
    pub const WRAP_NEAR: Gas = tgas(50);
}

/// Attached deposits
pub mod deposits {
    use refhat_core::YoctoNear;

    /// Storage registration on a fungible token (0.1 NEAR)
    pub const STORAGE_TO_REGISTER_WITH_FT: YoctoNear = 100_000_000_000_000_000_000_000;
}

/// Fee constants
pub mod fees {
    /// Pool fees are expressed in basis points of this divisor
    pub const FEE_DIVISOR: u32 = 10_000;
}

/// Stable-swap math parameters
pub mod stable {
    /// Stable pools compare balances at this precision
    pub const TARGET_DECIMALS: u8 = 18;

    /// Rated pools express rates with this precision
    pub const RATE_DECIMALS: u8 = 24;

    /// Newton iteration cap for the invariant and balance solvers
    pub const MAX_ITERATIONS: usize = 256;
}

/// Routing limits
pub mod routing {
    /// Most pool-disjoint paths one swap is split across
    pub const MAX_SPLIT_PATHS: usize = 3;

    /// Split search resolution, in permille of the input
    pub const SPLIT_STEP_PERMILLE: u128 = 5;

    /// A split must beat the best single path by this much (basis points)
    pub const MIN_SPLIT_GAIN_BPS: u128 = 50;

    /// Simple pools kept per directed token pair, ranked by reserves
    pub const DEFAULT_MAX_POOLS_PER_PAIR: usize = 3;

    /// Page size for `get_pools`
    pub const POOL_PAGE_SIZE: u64 = 300;
}

/// Wrapped NEAR token metadata (fixed 1:1 with the native asset)
pub mod wrapped_native {
    pub const NAME: &str = "Wrapped NEAR fungible token";
    pub const SYMBOL: &str = "wNEAR";
}

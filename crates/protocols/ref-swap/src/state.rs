//! Ref Swap State Types
//!
//! Tokens, pools, route steps and the errors raised while building a swap.

use refhat_core::constants::{NATIVE_TOKEN_ID, NEAR_DECIMALS};
use refhat_core::{u128_dec, AmountError, RpcError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::wrapped_native;

/// Fungible token metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Contract account ID, or `near` for the native asset
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Token {
    /// The native NEAR pseudo-token
    pub fn native() -> Self {
        Self {
            id: NATIVE_TOKEN_ID.to_string(),
            name: "NEAR".to_string(),
            symbol: "NEAR".to_string(),
            decimals: NEAR_DECIMALS,
            icon: None,
        }
    }

    /// Wrapped NEAR, 1:1 with the native asset
    pub fn wrapped_native(contract_id: &str) -> Self {
        Self {
            id: contract_id.to_string(),
            name: wrapped_native::NAME.to_string(),
            symbol: wrapped_native::SYMBOL.to_string(),
            decimals: NEAR_DECIMALS,
            icon: None,
        }
    }

    pub fn is_native(&self) -> bool {
        self.id == NATIVE_TOKEN_ID
    }
}

/// Ref pool kind as reported by `get_pools`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolKind {
    /// Constant-product pool
    SimplePool,
    /// Stable-swap pool without rates
    StableSwap,
    /// Stable-swap pool with per-token rates
    RatedSwap,
    /// Kinds this router does not price (degen pools, future kinds)
    #[serde(other)]
    Unsupported,
}

impl PoolKind {
    pub fn is_stable(&self) -> bool {
        matches!(self, Self::StableSwap | Self::RatedSwap)
    }
}

/// Pool record from `get_pools`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub id: u64,
    #[serde(rename = "pool_kind")]
    pub kind: PoolKind,
    pub token_account_ids: Vec<String>,
    #[serde(with = "u128_dec::vec")]
    pub amounts: Vec<u128>,
    /// Fee in basis points of `FEE_DIVISOR`
    pub total_fee: u32,
    #[serde(with = "u128_dec")]
    pub shares_total_supply: u128,
    #[serde(default)]
    pub amp: u64,
}

impl Pool {
    pub fn token_index(&self, token_id: &str) -> Option<usize> {
        self.token_account_ids.iter().position(|t| t == token_id)
    }

    /// A pool with no shares has never been funded or was fully drained
    pub fn is_empty(&self) -> bool {
        self.shares_total_supply == 0
    }
}

/// Stable pools split by kind, plus the constant-product pools
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolSnapshot {
    pub rated_pools: Vec<Pool>,
    pub unrated_pools: Vec<Pool>,
    pub simple_pools: Vec<Pool>,
}

impl PoolSnapshot {
    /// Unrated then rated, the order stable pools are scanned in
    pub fn stable_pools(&self) -> Vec<Pool> {
        self.unrated_pools
            .iter()
            .chain(self.rated_pools.iter())
            .cloned()
            .collect()
    }

    pub fn pool_count(&self) -> usize {
        self.rated_pools.len() + self.unrated_pools.len() + self.simple_pools.len()
    }
}

/// Stable pool state needed for invariant math
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StablePoolDetail {
    pub pool_id: u64,
    pub kind: PoolKind,
    pub token_account_ids: Vec<String>,
    pub decimals: Vec<u8>,
    #[serde(with = "u128_dec::vec")]
    pub amounts: Vec<u128>,
    /// Balances normalized to 18 decimals
    #[serde(with = "u128_dec::vec")]
    pub c_amounts: Vec<u128>,
    /// Per-token rates at 24 decimals; empty for unrated pools
    #[serde(with = "u128_dec::vec")]
    pub rates: Vec<u128>,
    pub total_fee: u32,
    pub amp: u64,
}

impl StablePoolDetail {
    pub fn token_index(&self, token_id: &str) -> Option<usize> {
        self.token_account_ids.iter().position(|t| t == token_id)
    }
}

/// Pool snapshot plus stable details, everything routing needs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketState {
    pub pools: PoolSnapshot,
    pub stable_details: Vec<StablePoolDetail>,
}

impl MarketState {
    pub fn stable_detail(&self, pool_id: u64) -> Option<&StablePoolDetail> {
        self.stable_details.iter().find(|d| d.pool_id == pool_id)
    }
}

/// Which estimation mode produced a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteOrigin {
    Smart,
    Simple,
}

/// One hop of a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapStep {
    pub pool_id: u64,
    pub pool_kind: PoolKind,
    pub token_in: String,
    pub token_out: String,
    #[serde(with = "u128_dec")]
    pub amount_in: u128,
    #[serde(with = "u128_dec")]
    pub estimate: u128,
    pub origin: RouteOrigin,
}

/// Why a single estimation attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("No pool connects {token_in} to {token_out}")]
    NoPoolAvailable { token_in: String, token_out: String },

    #[error("Insufficient liquidity to swap {token_in} for {token_out}")]
    InsufficientLiquidity { token_in: String, token_out: String },

    #[error("Stable pool {pool_id} has no detail")]
    MissingStableDetail { pool_id: u64 },

    #[error("Smart routing is disabled")]
    SmartRoutingDisabled,
}

/// Swap pipeline errors
#[derive(Debug, Error)]
pub enum SwapError {
    #[error("Token not found: {identifier}")]
    NotFound { identifier: String },

    #[error("Input and output tokens are identical")]
    IdenticalTokens,

    #[error("{0}")]
    InvalidAmount(#[from] AmountError),

    #[error("Upstream unavailable: {reason}")]
    UpstreamUnavailable { reason: String },

    #[error("Upstream timed out: {reason}")]
    UpstreamTimeout { reason: String },

    #[error("Routing failed: {smart} (fallback: {fallback})")]
    RoutingFailed { smart: RouteError, fallback: RouteError },

    #[error("Transaction build failed: {0}")]
    BuildFailed(String),
}

impl SwapError {
    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::IdenticalTokens => "identical_tokens",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::UpstreamUnavailable { .. } => "upstream_unavailable",
            Self::UpstreamTimeout { .. } => "upstream_timeout",
            Self::RoutingFailed { .. } => "routing_failed",
            Self::BuildFailed(_) => "build_failed",
        }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::IdenticalTokens | Self::InvalidAmount(_) | Self::BuildFailed(_) => 400,
            Self::RoutingFailed { .. } => 422,
            Self::UpstreamTimeout { .. } => 408,
            Self::UpstreamUnavailable { .. } => 424,
        }
    }
}

impl From<RpcError> for SwapError {
    fn from(err: RpcError) -> Self {
        if err.is_timeout() {
            Self::UpstreamTimeout {
                reason: err.to_string(),
            }
        } else {
            Self::UpstreamUnavailable {
                reason: err.to_string(),
            }
        }
    }
}

//! Upstream data sources
//!
//! Seams between the swap pipeline and the chain. `fetch::RefChainSource`
//! implements all three against NEAR RPC; tests substitute in-memory doubles.

use async_trait::async_trait;

use crate::state::{Pool, StablePoolDetail, SwapError, Token};

/// Fungible token metadata (`ft_metadata`)
#[async_trait]
pub trait TokenMetadataSource: Send + Sync {
    async fn ft_metadata(&self, token_id: &str) -> Result<Token, SwapError>;
}

/// Ref exchange pool listing and stable pool details
#[async_trait]
pub trait PoolSource: Send + Sync {
    /// Every pool the exchange knows about, in pool-id order
    async fn list_pools(&self) -> Result<Vec<Pool>, SwapError>;

    /// Detail for one stable or rated pool
    async fn stable_pool_detail(&self, pool: &Pool) -> Result<StablePoolDetail, SwapError>;
}

/// Storage registration on fungible token contracts
#[async_trait]
pub trait StorageSource: Send + Sync {
    async fn is_registered(&self, token_id: &str, account_id: &str) -> Result<bool, SwapError>;
}

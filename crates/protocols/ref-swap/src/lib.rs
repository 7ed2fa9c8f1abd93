//! Ref Finance Swap Protocol Implementation
//!
//! This crate turns "swap X of token A for token B" into unsigned NEAR
//! transactions against the Ref Finance exchange: token resolution, pool
//! snapshots, smart routing with a simple-pool fallback, transaction
//! assembly and native NEAR wrapping.

pub mod calculator;
pub mod constants;
pub mod fetch;
pub mod native;
pub mod pipeline;
pub mod resolver;
pub mod router;
pub mod snapshot;
pub mod sources;
pub mod state;
pub mod tx_builder;

// Re-exports
pub use calculator::{apply_slippage, calculate_output, calculate_stable_output};
pub use constants::{deposits, fees, gas, routing};
pub use fetch::RefChainSource;
pub use native::NativeMode;
pub use pipeline::{SwapService, SwapSettings};
pub use resolver::{TokenMatch, TokenRegistry, TokenResolver};
pub use router::{estimate, estimate_with_fallback};
pub use snapshot::PoolSnapshotProvider;
pub use sources::{PoolSource, StorageSource, TokenMetadataSource};
pub use state::{
    MarketState, Pool, PoolKind, PoolSnapshot, RouteError, RouteOrigin, StablePoolDetail, SwapError, SwapStep, Token,
};
pub use tx_builder::{build_swap_transactions, SwapAction, SwapActionMessage, SwapBuildParams};

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory chain double shared by the unit tests

    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::sources::{PoolSource, StorageSource, TokenMetadataSource};
    use crate::state::{Pool, PoolKind, StablePoolDetail, SwapError, Token};

    pub fn simple_pool(id: u64, token_a: &str, token_b: &str, reserve_a: u128, reserve_b: u128, fee: u32) -> Pool {
        Pool {
            id,
            kind: PoolKind::SimplePool,
            token_account_ids: vec![token_a.to_string(), token_b.to_string()],
            amounts: vec![reserve_a, reserve_b],
            total_fee: fee,
            shares_total_supply: 1_000,
            amp: 0,
        }
    }

    pub fn stable_pool(id: u64, kind: PoolKind, tokens: &[&str]) -> Pool {
        Pool {
            id,
            kind,
            token_account_ids: tokens.iter().map(|t| t.to_string()).collect(),
            amounts: vec![1; tokens.len()],
            total_fee: 5,
            shares_total_supply: 1_000,
            amp: 240,
        }
    }

    /// Balanced detail holding `depth` whole tokens on every side
    pub fn stable_detail(pool: &Pool, decimals: u8, depth: u128) -> StablePoolDetail {
        let n = pool.token_account_ids.len();
        StablePoolDetail {
            pool_id: pool.id,
            kind: pool.kind,
            token_account_ids: pool.token_account_ids.clone(),
            decimals: vec![decimals; n],
            amounts: vec![depth * 10u128.pow(decimals as u32); n],
            c_amounts: vec![depth * 10u128.pow(18); n],
            rates: if pool.kind == PoolKind::RatedSwap {
                vec![10u128.pow(24); n]
            } else {
                vec![]
            },
            total_fee: pool.total_fee,
            amp: pool.amp,
        }
    }

    #[derive(Default)]
    pub struct FakeChain {
        tokens: HashMap<String, Token>,
        pools: Vec<Pool>,
        details: HashMap<u64, StablePoolDetail>,
        registered: HashSet<(String, String)>,
        fail_pools: bool,
        misreport_details: bool,
        metadata_calls: AtomicUsize,
        pool_calls: AtomicUsize,
        detail_calls: AtomicUsize,
        storage_calls: AtomicUsize,
    }

    impl FakeChain {
        pub fn with_token(mut self, id: &str, symbol: &str, decimals: u8) -> Self {
            self.tokens.insert(
                id.to_string(),
                Token {
                    id: id.to_string(),
                    name: symbol.to_string(),
                    symbol: symbol.to_string(),
                    decimals,
                    icon: Some("data:image/svg+xml,<svg/>".to_string()),
                },
            );
            self
        }

        pub fn with_pool(mut self, pool: Pool) -> Self {
            self.pools.push(pool);
            self
        }

        /// Stable pool plus a deep balanced detail for it
        pub fn with_stable_pool(mut self, pool: Pool) -> Self {
            self.details.insert(pool.id, stable_detail(&pool, 6, 1_000_000));
            self.pools.push(pool);
            self
        }

        pub fn with_registration(mut self, token_id: &str, account_id: &str) -> Self {
            self.registered.insert((token_id.to_string(), account_id.to_string()));
            self
        }

        pub fn failing_pools(mut self) -> Self {
            self.fail_pools = true;
            self
        }

        /// Details come back tagged with the wrong pool id
        pub fn misreporting_details(mut self) -> Self {
            self.misreport_details = true;
            self
        }

        pub fn metadata_calls(&self) -> usize {
            self.metadata_calls.load(Ordering::SeqCst)
        }

        pub fn pool_calls(&self) -> usize {
            self.pool_calls.load(Ordering::SeqCst)
        }

        pub fn detail_calls(&self) -> usize {
            self.detail_calls.load(Ordering::SeqCst)
        }

        pub fn storage_calls(&self) -> usize {
            self.storage_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenMetadataSource for FakeChain {
        async fn ft_metadata(&self, token_id: &str) -> Result<Token, SwapError> {
            self.metadata_calls.fetch_add(1, Ordering::SeqCst);
            self.tokens.get(token_id).cloned().ok_or_else(|| SwapError::NotFound {
                identifier: token_id.to_string(),
            })
        }
    }

    #[async_trait]
    impl PoolSource for FakeChain {
        async fn list_pools(&self) -> Result<Vec<Pool>, SwapError> {
            self.pool_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_pools {
                return Err(SwapError::UpstreamUnavailable {
                    reason: "connection refused".into(),
                });
            }
            Ok(self.pools.clone())
        }

        async fn stable_pool_detail(&self, pool: &Pool) -> Result<StablePoolDetail, SwapError> {
            self.detail_calls.fetch_add(1, Ordering::SeqCst);
            let mut detail = self.details.get(&pool.id).cloned().ok_or_else(|| SwapError::UpstreamUnavailable {
                reason: format!("no detail for pool {}", pool.id),
            })?;
            if self.misreport_details {
                detail.pool_id += 1_000;
            }
            Ok(detail)
        }
    }

    #[async_trait]
    impl StorageSource for FakeChain {
        async fn is_registered(&self, token_id: &str, account_id: &str) -> Result<bool, SwapError> {
            self.storage_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .registered
                .contains(&(token_id.to_string(), account_id.to_string())))
        }
    }
}

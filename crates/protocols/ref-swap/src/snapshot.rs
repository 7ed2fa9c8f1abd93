//! Pool Snapshot Provider
//!
//! Point-in-time pool listing classified by kind, plus stable pool details.
//! Nothing is cached between requests.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::debug;

use crate::sources::PoolSource;
use crate::state::{MarketState, Pool, PoolKind, PoolSnapshot, StablePoolDetail, SwapError};

/// Split pools into rated, unrated and simple. Empty and unsupported pools
/// are dropped.
pub fn classify_pools(pools: Vec<Pool>) -> PoolSnapshot {
    let mut snapshot = PoolSnapshot::default();
    for pool in pools {
        if pool.is_empty() {
            continue;
        }
        match pool.kind {
            PoolKind::RatedSwap => snapshot.rated_pools.push(pool),
            PoolKind::StableSwap => snapshot.unrated_pools.push(pool),
            PoolKind::SimplePool => snapshot.simple_pools.push(pool),
            PoolKind::Unsupported => {}
        }
    }
    snapshot
}

#[derive(Clone)]
pub struct PoolSnapshotProvider {
    source: Arc<dyn PoolSource>,
}

impl PoolSnapshotProvider {
    pub fn new(source: Arc<dyn PoolSource>) -> Self {
        Self { source }
    }

    pub async fn snapshot(&self) -> Result<PoolSnapshot, SwapError> {
        let snapshot = classify_pools(self.source.list_pools().await?);
        debug!(
            rated = snapshot.rated_pools.len(),
            unrated = snapshot.unrated_pools.len(),
            simple = snapshot.simple_pools.len(),
            "Pool snapshot"
        );
        Ok(snapshot)
    }

    /// Details for the given stable pools, fetched concurrently.
    /// One failure fails the whole batch.
    pub async fn stable_detail(&self, pools: &[Pool]) -> Result<Vec<StablePoolDetail>, SwapError> {
        try_join_all(pools.iter().map(|pool| self.source.stable_pool_detail(pool))).await
    }

    /// Snapshot followed by the details of its stable pools
    pub async fn market(&self) -> Result<MarketState, SwapError> {
        let pools = self.snapshot().await?;
        let stable_details = self.stable_detail(&pools.stable_pools()).await?;
        Ok(MarketState {
            pools,
            stable_details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{simple_pool, stable_pool, FakeChain};

    #[test]
    fn test_classify_pools_is_exclusive() {
        let mut empty = simple_pool(9, "a.near", "b.near", 0, 0, 30);
        empty.shares_total_supply = 0;
        let mut degen = simple_pool(10, "a.near", "b.near", 5, 5, 30);
        degen.kind = PoolKind::Unsupported;

        let snapshot = classify_pools(vec![
            simple_pool(0, "a.near", "b.near", 100, 100, 30),
            stable_pool(1, PoolKind::StableSwap, &["usdc.near", "usdt.near"]),
            stable_pool(2, PoolKind::RatedSwap, &["linear-protocol.near", "wrap.near"]),
            empty,
            degen,
        ]);

        assert_eq!(snapshot.simple_pools.len(), 1);
        assert_eq!(snapshot.unrated_pools[0].id, 1);
        assert_eq!(snapshot.rated_pools[0].id, 2);
        assert_eq!(snapshot.pool_count(), 3);
    }

    #[tokio::test]
    async fn test_market_fetches_details_for_stable_pools_only() {
        let chain = Arc::new(
            FakeChain::default()
                .with_pool(simple_pool(0, "a.near", "b.near", 100, 100, 30))
                .with_stable_pool(stable_pool(1, PoolKind::StableSwap, &["usdc.near", "usdt.near"])),
        );
        let provider = PoolSnapshotProvider::new(chain.clone());

        let market = provider.market().await.unwrap();
        assert_eq!(market.stable_details.len(), 1);
        assert!(market.stable_detail(1).is_some());
        assert_eq!(chain.detail_calls(), 1);
    }

    #[tokio::test]
    async fn test_any_upstream_failure_fails_snapshot() {
        let chain = Arc::new(FakeChain::default().failing_pools());
        let provider = PoolSnapshotProvider::new(chain);
        let err = provider.market().await.unwrap_err();
        assert_eq!(err.error_code(), "upstream_unavailable");
    }
}

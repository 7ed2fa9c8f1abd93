//! Swap pipeline
//!
//! identifiers → tokens → pool snapshot → route → transactions → native
//! adjustments. One call per request; nothing is shared between requests.

use std::sync::Arc;

use near_tx::TransactionEnvelope;
use refhat_core::constants::NEAR_DECIMALS;
use refhat_core::{check_quantity, parse_units_truncated, AppConfig};
use tracing::{debug, info};

use crate::fetch::RefChainSource;
use crate::native::{
    enable_output_unwrap, insert_before_last, near_deposit_transaction, near_withdraw_transaction, NativeMode,
};
use crate::resolver::{TokenRegistry, TokenResolver};
use crate::router::{estimate, estimate_with_fallback, route_output, split_paths};
use crate::snapshot::PoolSnapshotProvider;
use crate::sources::StorageSource;
use crate::state::{SwapError, Token};
use crate::tx_builder::{build_swap_transactions, SwapBuildParams};

/// Per-deployment swap parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SwapSettings {
    pub exchange_id: String,
    pub wrap_near_id: String,
    pub referral_id: Option<String>,
    pub slippage_tolerance: f64,
    pub enable_smart_routing: bool,
    pub max_hops: usize,
}

impl SwapSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            exchange_id: config.contracts.ref_exchange.clone(),
            wrap_near_id: config.contracts.wrap_near.clone(),
            referral_id: config.swap.referral_id.clone(),
            slippage_tolerance: config.swap.slippage_tolerance,
            enable_smart_routing: config.swap.enable_smart_routing,
            max_hops: config.swap.max_hops,
        }
    }
}

impl Default for SwapSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Builds swap transactions for an account
#[derive(Clone)]
pub struct SwapService {
    resolver: TokenResolver,
    pools: PoolSnapshotProvider,
    storage: Arc<dyn StorageSource>,
    settings: SwapSettings,
}

impl SwapService {
    pub fn new(
        resolver: TokenResolver,
        pools: PoolSnapshotProvider,
        storage: Arc<dyn StorageSource>,
        settings: SwapSettings,
    ) -> Self {
        Self {
            resolver,
            pools,
            storage,
            settings,
        }
    }

    /// Service reading everything through one chain source
    pub fn from_chain(source: Arc<RefChainSource>, registry: TokenRegistry, settings: SwapSettings) -> Self {
        Self::new(
            TokenResolver::new(registry, source.clone()),
            PoolSnapshotProvider::new(source.clone()),
            source,
            settings,
        )
    }

    /// Resolve a single identifier to its metadata
    pub async fn token_metadata(&self, identifier: &str) -> Result<Token, SwapError> {
        self.resolver.resolve(identifier).await
    }

    /// Unsigned transactions swapping `quantity` of `token_in` for `token_out`
    pub async fn build_swap(
        &self,
        token_in: &str,
        token_out: &str,
        quantity: &str,
        account_id: &str,
    ) -> Result<Vec<TransactionEnvelope>, SwapError> {
        let wrap = self.settings.wrap_near_id.as_str();
        let in_match = self.resolver.match_identifier(token_in)?;
        let out_match = self.resolver.match_identifier(token_out)?;
        let mode = NativeMode::classify(&in_match, &out_match, wrap)?;
        check_quantity(quantity)?;

        info!(
            token_in = in_match.routing_id(wrap),
            token_out = out_match.routing_id(wrap),
            quantity,
            account_id,
            ?mode,
            "Building swap"
        );

        match mode {
            NativeMode::WrapOnly => {
                let amount = parse_units_truncated(quantity, NEAR_DECIMALS)?;
                return Ok(vec![near_deposit_transaction(account_id, wrap, amount)]);
            }
            NativeMode::UnwrapOnly => {
                let amount = parse_units_truncated(quantity, NEAR_DECIMALS)?;
                return Ok(vec![near_withdraw_transaction(account_id, wrap, amount)]);
            }
            NativeMode::SwapWithNativeLeg { .. } | NativeMode::SwapNoNative => {}
        }

        let (token_in, token_out, market, registered) = tokio::try_join!(
            self.resolver.routing_metadata(&in_match, wrap),
            self.resolver.routing_metadata(&out_match, wrap),
            self.pools.market(),
            self.output_registered(out_match.routing_id(wrap), account_id, out_match.is_native()),
        )?;

        // Digits past the token's precision are dropped, not rejected
        let amount_in = parse_units_truncated(quantity, token_in.decimals)?;
        let route = estimate_with_fallback(self.settings.enable_smart_routing, |smart| {
            estimate(&token_in.id, &token_out.id, amount_in, &market, smart, self.settings.max_hops)
        })?;
        debug!(
            hops = route.len(),
            paths = split_paths(&route).len(),
            origin = ?route.first().map(|s| s.origin),
            estimate = %route_output(&route),
            "Route selected"
        );

        let transactions = build_swap_transactions(&SwapBuildParams {
            token_in: &token_in,
            token_out: &token_out,
            amount_in,
            route: &route,
            slippage_tolerance: self.settings.slippage_tolerance,
            account_id,
            referral_id: self.settings.referral_id.as_deref(),
            exchange_id: &self.settings.exchange_id,
            register_output: !registered,
        })?;

        match mode {
            NativeMode::SwapWithNativeLeg { native_in: true } => Ok(insert_before_last(
                transactions,
                near_deposit_transaction(account_id, wrap, amount_in),
            )),
            NativeMode::SwapWithNativeLeg { native_in: false } => enable_output_unwrap(transactions),
            _ => Ok(transactions),
        }
    }

    /// Native output is unwrapped by the exchange, so no registration is needed
    async fn output_registered(&self, token_id: &str, account_id: &str, native_out: bool) -> Result<bool, SwapError> {
        if native_out {
            return Ok(true);
        }
        self.storage.is_registered(token_id, account_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PoolKind;
    use crate::testing::{simple_pool, stable_pool, FakeChain};
    use crate::tx_builder::SwapActionMessage;
    use refhat_core::constants::YOCTO_PER_NEAR;

    const USDT: &str = "usdt.tether-token.near";
    const USDC: &str = "17208628f84f5d6ad33f0da3bbbeb27ffcb398eac501a31bd6ad2011e36133a1";
    const WRAP: &str = "wrap.near";
    const E6: u128 = 1_000_000;

    fn chain() -> FakeChain {
        FakeChain::default()
            .with_token(USDT, "USDt", 6)
            .with_token(USDC, "USDC", 6)
            .with_pool(simple_pool(0, USDT, USDC, 1_000_000 * E6, 1_000_000 * E6, 5))
            .with_pool(simple_pool(1, WRAP, USDT, 100_000 * YOCTO_PER_NEAR, 500_000 * E6, 30))
    }

    fn service(chain: &Arc<FakeChain>) -> SwapService {
        SwapService::new(
            TokenResolver::new(TokenRegistry::builtin(), chain.clone()),
            PoolSnapshotProvider::new(chain.clone()),
            chain.clone(),
            SwapSettings::default(),
        )
    }

    fn swap_msg(tx: &TransactionEnvelope) -> SwapActionMessage {
        let call = tx.function_calls().last().unwrap();
        SwapActionMessage::from_msg(call.arg_str("msg").unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_token_to_token_swap() {
        let chain = Arc::new(chain().with_registration(USDC, "alice.near"));
        let txs = service(&chain).build_swap("usdt", "usdc", "10", "alice.near").await.unwrap();

        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].receiver_id, USDT);
        let call = txs[0].function_calls().next().unwrap();
        assert_eq!(call.arg_str("amount"), Some("10000000"));

        let msg = swap_msg(&txs[0]);
        assert_eq!(msg.first_pool(), Some(0));
        assert!(msg.skip_unwrap_near);
        assert_eq!(msg.referral_id.as_deref(), Some("mintbase.near"));
    }

    #[tokio::test]
    async fn test_unregistered_output_gets_storage_deposit_first() {
        let chain = Arc::new(chain());
        let txs = service(&chain).build_swap("usdt", "usdc", "10", "bob.near").await.unwrap();

        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].receiver_id, USDC);
        assert_eq!(txs[0].function_calls().next().unwrap().method_name, "storage_deposit");
        assert_eq!(txs[1].function_calls().next().unwrap().method_name, "ft_transfer_call");
    }

    #[tokio::test]
    async fn test_native_input_wraps_before_swap() {
        let chain = Arc::new(chain().with_registration(USDT, "alice.near"));
        let txs = service(&chain).build_swap("near", "usdt", "1.5", "alice.near").await.unwrap();

        assert_eq!(txs.len(), 2);
        let wrap = txs[0].function_calls().next().unwrap();
        assert_eq!(txs[0].receiver_id, WRAP);
        assert_eq!(wrap.method_name, "near_deposit");
        assert_eq!(wrap.deposit, (YOCTO_PER_NEAR * 3 / 2).to_string());
        assert_eq!(txs[1].receiver_id, WRAP);
        assert_eq!(swap_msg(&txs[1]).first_pool(), Some(1));
    }

    #[tokio::test]
    async fn test_native_output_unwraps_without_storage_check() {
        let chain = Arc::new(chain());
        let txs = service(&chain).build_swap("usdt", "NEAR", "100", "alice.near").await.unwrap();

        assert_eq!(txs.len(), 1);
        assert!(!swap_msg(&txs[0]).skip_unwrap_near);
        assert_eq!(chain.storage_calls(), 0);
    }

    #[tokio::test]
    async fn test_wrap_and_unwrap_only_skip_routing() {
        let chain = Arc::new(chain());
        let svc = service(&chain);

        let txs = svc.build_swap("near", "wrap.near", "2", "alice.near").await.unwrap();
        assert_eq!(txs.len(), 1);
        let call = txs[0].function_calls().next().unwrap();
        assert_eq!(call.method_name, "near_deposit");
        assert_eq!(call.deposit, (2 * YOCTO_PER_NEAR).to_string());

        let txs = svc.build_swap("wrap.near", "near", "2", "alice.near").await.unwrap();
        let call = txs[0].function_calls().next().unwrap();
        assert_eq!(call.method_name, "near_withdraw");
        assert_eq!(call.deposit, "1");

        assert_eq!(chain.pool_calls(), 0);
        assert_eq!(chain.metadata_calls(), 0);
    }

    #[tokio::test]
    async fn test_rejections_happen_before_io() {
        let chain = Arc::new(chain());
        let svc = service(&chain);

        let err = svc.build_swap("usdt", "USDT", "1", "alice.near").await.unwrap_err();
        assert!(matches!(err, SwapError::IdenticalTokens));

        let err = svc.build_swap("usdt", "usdc", "abc", "alice.near").await.unwrap_err();
        assert_eq!(err.error_code(), "invalid_amount");

        let err = svc.build_swap("zzzqqq", "usdc", "1", "alice.near").await.unwrap_err();
        assert_eq!(err.error_code(), "not_found");

        assert_eq!(chain.pool_calls(), 0);
        assert_eq!(chain.metadata_calls(), 0);
    }

    #[tokio::test]
    async fn test_excess_precision_truncated_to_token_decimals() {
        let chain = Arc::new(chain().with_registration(USDC, "alice.near"));
        let svc = service(&chain);

        let txs = svc.build_swap("usdt", "usdc", "1.1234567", "alice.near").await.unwrap();
        let call = txs[0].function_calls().next().unwrap();
        assert_eq!(call.arg_str("amount"), Some("1123456"));

        let err = svc.build_swap("usdt", "usdc", "0.0000009", "alice.near").await.unwrap_err();
        assert_eq!(err.error_code(), "invalid_amount");
    }

    #[tokio::test]
    async fn test_large_swap_splits_across_parallel_pools() {
        let chain = Arc::new(
            chain()
                .with_pool(simple_pool(2, USDT, USDC, 1_000_000 * E6, 1_000_000 * E6, 5))
                .with_registration(USDC, "alice.near"),
        );
        let txs = service(&chain).build_swap("usdt", "usdc", "100000", "alice.near").await.unwrap();

        assert_eq!(txs.len(), 1);
        let msg = swap_msg(&txs[0]);
        assert_eq!(msg.actions.len(), 2);
        let pools: Vec<u64> = msg.actions.iter().map(|a| a.pool_id).collect();
        assert_eq!(pools, vec![0, 2]);
        let routed: u128 = msg.actions.iter().filter_map(|a| a.amount_in).sum();
        assert_eq!(routed, 100_000 * E6);
        assert!(msg.actions.iter().all(|a| a.min_amount_out > 0));
    }

    #[tokio::test]
    async fn test_smart_failure_falls_back_to_direct_pool() {
        let chain = Arc::new(
            chain()
                .with_stable_pool(stable_pool(9, PoolKind::StableSwap, &[USDT, USDC]))
                .misreporting_details()
                .with_registration(USDC, "alice.near"),
        );
        let txs = service(&chain).build_swap("usdt", "usdc", "10", "alice.near").await.unwrap();
        assert_eq!(swap_msg(&txs[0]).first_pool(), Some(0));
    }

    #[tokio::test]
    async fn test_routing_failure_and_upstream_failure() {
        let chain = Arc::new(FakeChain::default().with_token(USDT, "USDt", 6).with_token(USDC, "USDC", 6));
        let err = service(&chain).build_swap("usdt", "usdc", "1", "alice.near").await.unwrap_err();
        assert!(matches!(err, SwapError::RoutingFailed { .. }));

        let chain = Arc::new(chain_failing());
        let err = service(&chain).build_swap("usdt", "usdc", "1", "alice.near").await.unwrap_err();
        assert_eq!(err.error_code(), "upstream_unavailable");
    }

    fn chain_failing() -> FakeChain {
        chain().failing_pools()
    }
}

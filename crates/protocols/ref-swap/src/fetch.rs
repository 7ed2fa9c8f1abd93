//! Chain fetching for Ref Finance
//!
//! Reads pools from the Ref exchange contract and token metadata / storage
//! registration from token contracts via NEAR RPC view calls.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use near_rpc_client::{view_json, ViewCaller};
use refhat_core::{u128_dec, RpcError};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::constants::routing::POOL_PAGE_SIZE;
use crate::sources::{PoolSource, StorageSource, TokenMetadataSource};
use crate::state::{Pool, PoolKind, StablePoolDetail, SwapError, Token};

/// Pool entry as returned by `get_pools` (ids are implied by position)
#[derive(Debug, Deserialize)]
struct RawPoolInfo {
    pool_kind: PoolKind,
    token_account_ids: Vec<String>,
    #[serde(with = "u128_dec::vec")]
    amounts: Vec<u128>,
    total_fee: u32,
    #[serde(with = "u128_dec")]
    shares_total_supply: u128,
    #[serde(default)]
    amp: u64,
}

impl RawPoolInfo {
    fn into_pool(self, id: u64) -> Pool {
        Pool {
            id,
            kind: self.pool_kind,
            token_account_ids: self.token_account_ids,
            amounts: self.amounts,
            total_fee: self.total_fee,
            shares_total_supply: self.shares_total_supply,
            amp: self.amp,
        }
    }
}

/// `get_stable_pool` / `get_rated_pool` result
#[derive(Debug, Deserialize)]
struct RawStablePool {
    token_account_ids: Vec<String>,
    decimals: Vec<u8>,
    #[serde(with = "u128_dec::vec")]
    amounts: Vec<u128>,
    #[serde(with = "u128_dec::vec")]
    c_amounts: Vec<u128>,
    total_fee: u32,
    amp: u64,
    #[serde(default, with = "u128_dec::vec")]
    rates: Vec<u128>,
}

/// NEP-148 metadata
#[derive(Debug, Deserialize)]
struct RawFtMetadata {
    name: String,
    symbol: String,
    decimals: u8,
    #[serde(default)]
    icon: Option<String>,
}

/// Ref exchange and token contracts behind one RPC caller
#[derive(Clone)]
pub struct RefChainSource {
    caller: Arc<dyn ViewCaller>,
    exchange_id: String,
}

impl RefChainSource {
    pub fn new(caller: Arc<dyn ViewCaller>, exchange_id: impl Into<String>) -> Self {
        Self {
            caller,
            exchange_id: exchange_id.into(),
        }
    }

    async fn pool_count(&self) -> Result<u64, SwapError> {
        Ok(view_json(self.caller.as_ref(), &self.exchange_id, "get_number_of_pools", json!({})).await?)
    }

    async fn pools_page(&self, from_index: u64, limit: u64) -> Result<Vec<Pool>, SwapError> {
        let raw: Vec<RawPoolInfo> = view_json(
            self.caller.as_ref(),
            &self.exchange_id,
            "get_pools",
            json!({ "from_index": from_index, "limit": limit }),
        )
        .await?;

        Ok(raw
            .into_iter()
            .zip(from_index..)
            .map(|(info, id)| info.into_pool(id))
            .collect())
    }
}

#[async_trait]
impl PoolSource for RefChainSource {
    async fn list_pools(&self) -> Result<Vec<Pool>, SwapError> {
        let count = self.pool_count().await?;
        let pages = (0..count)
            .step_by(POOL_PAGE_SIZE as usize)
            .map(|from| self.pools_page(from, POOL_PAGE_SIZE.min(count - from)));

        let pools: Vec<Pool> = try_join_all(pages).await?.into_iter().flatten().collect();
        debug!(count, fetched = pools.len(), "Fetched Ref pools");
        Ok(pools)
    }

    async fn stable_pool_detail(&self, pool: &Pool) -> Result<StablePoolDetail, SwapError> {
        let method = match pool.kind {
            PoolKind::RatedSwap => "get_rated_pool",
            _ => "get_stable_pool",
        };
        let raw: RawStablePool = view_json(
            self.caller.as_ref(),
            &self.exchange_id,
            method,
            json!({ "pool_id": pool.id }),
        )
        .await?;

        Ok(StablePoolDetail {
            pool_id: pool.id,
            kind: pool.kind,
            token_account_ids: raw.token_account_ids,
            decimals: raw.decimals,
            amounts: raw.amounts,
            c_amounts: raw.c_amounts,
            rates: raw.rates,
            total_fee: raw.total_fee,
            amp: raw.amp,
        })
    }
}

#[async_trait]
impl TokenMetadataSource for RefChainSource {
    async fn ft_metadata(&self, token_id: &str) -> Result<Token, SwapError> {
        let raw: RawFtMetadata = view_json(self.caller.as_ref(), token_id, "ft_metadata", json!({}))
            .await
            .map_err(|e| missing_contract(e, token_id))?;

        Ok(Token {
            id: token_id.to_string(),
            name: raw.name,
            symbol: raw.symbol,
            decimals: raw.decimals,
            icon: raw.icon,
        })
    }
}

#[async_trait]
impl StorageSource for RefChainSource {
    async fn is_registered(&self, token_id: &str, account_id: &str) -> Result<bool, SwapError> {
        let balance: Option<Value> = view_json(
            self.caller.as_ref(),
            token_id,
            "storage_balance_of",
            json!({ "account_id": account_id }),
        )
        .await?;
        Ok(balance.is_some())
    }
}

/// Markers in RPC errors meaning the account holds no usable token contract
const NOT_A_TOKEN_MARKERS: [&str; 4] = ["does not exist", "CodeDoesNotExist", "MethodNotFound", "MethodResolveError"];

/// `ft_metadata` failing because the account is no token means "no such token"
fn missing_contract(err: RpcError, token_id: &str) -> SwapError {
    let not_a_token = match &err {
        RpcError::ApiError { message } => NOT_A_TOKEN_MARKERS.iter().any(|m| message.contains(m)),
        // Some contract answered, but not with token metadata
        RpcError::ParseError(_) => true,
        _ => false,
    };
    if not_a_token {
        SwapError::NotFound {
            identifier: token_id.to_string(),
        }
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use near_rpc_client::MockViewCaller;

    const EXCHANGE: &str = "v2.ref-finance.near";

    fn raw_pool(kind: &str, tokens: [&str; 2]) -> Value {
        json!({
            "pool_kind": kind,
            "token_account_ids": tokens,
            "amounts": ["1000", "2000"],
            "total_fee": 30,
            "shares_total_supply": "10",
            "amp": 0
        })
    }

    #[tokio::test]
    async fn test_list_pools_pages_and_assigns_ids() {
        let mock = MockViewCaller::new()
            .with_response(EXCHANGE, "get_number_of_pools", json!(POOL_PAGE_SIZE + 2))
            .with_handler(EXCHANGE, "get_pools", |args| {
                let from = args["from_index"].as_u64().unwrap_or(0);
                let limit = args["limit"].as_u64().unwrap_or(0);
                let pools: Vec<Value> = (0..limit)
                    .map(|_| raw_pool("SIMPLE_POOL", ["a.near", "b.near"]))
                    .collect();
                assert!(from == 0 || from == POOL_PAGE_SIZE);
                Ok(json!(pools))
            });
        let mock = Arc::new(mock);
        let source = RefChainSource::new(mock.clone(), EXCHANGE);

        let pools = source.list_pools().await.unwrap();
        assert_eq!(pools.len() as u64, POOL_PAGE_SIZE + 2);
        assert_eq!(pools[0].id, 0);
        assert_eq!(pools.last().unwrap().id, POOL_PAGE_SIZE + 1);
        assert_eq!(mock.call_count(EXCHANGE, "get_pools"), 2);
    }

    #[tokio::test]
    async fn test_stable_detail_uses_rated_method() {
        let mock = MockViewCaller::new().with_response(
            EXCHANGE,
            "get_rated_pool",
            json!({
                "pool_kind": "RATED_SWAP",
                "token_account_ids": ["linear-protocol.near", "wrap.near"],
                "decimals": [24, 24],
                "amounts": ["10", "20"],
                "c_amounts": ["1", "2"],
                "total_fee": 5,
                "shares_total_supply": "3",
                "amp": 240,
                "rates": ["1100000000000000000000000", "1000000000000000000000000"]
            }),
        );
        let source = RefChainSource::new(Arc::new(mock), EXCHANGE);
        let pool = Pool {
            id: 3688,
            kind: PoolKind::RatedSwap,
            token_account_ids: vec![],
            amounts: vec![],
            total_fee: 5,
            shares_total_supply: 3,
            amp: 240,
        };

        let detail = source.stable_pool_detail(&pool).await.unwrap();
        assert_eq!(detail.pool_id, 3688);
        assert_eq!(detail.rates.len(), 2);
        assert_eq!(detail.c_amounts, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_ft_metadata_and_missing_contract() {
        let mock = MockViewCaller::new()
            .with_response(
                "usdt.tether-token.near",
                "ft_metadata",
                json!({"spec": "ft-1.0.0", "name": "Tether USD", "symbol": "USDt", "decimals": 6, "icon": "data:..."}),
            )
            .with_error("nope.near", "ft_metadata", || RpcError::ApiError {
                message: "account nope.near does not exist while viewing".into(),
            });
        let source = RefChainSource::new(Arc::new(mock), EXCHANGE);

        let token = source.ft_metadata("usdt.tether-token.near").await.unwrap();
        assert_eq!(token.symbol, "USDt");
        assert_eq!(token.decimals, 6);

        let err = source.ft_metadata("nope.near").await.unwrap_err();
        assert!(matches!(err, SwapError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_non_token_accounts_are_not_found() {
        let mock = MockViewCaller::new()
            .with_error("alice.near", "ft_metadata", || RpcError::ApiError {
                message: "wasm execution failed with error: MethodResolveError(MethodNotFound)".into(),
            })
            .with_response("app.near", "ft_metadata", json!({"version": 2}))
            .with_error("flaky.near", "ft_metadata", || RpcError::Unreachable {
                url: "https://rpc.mainnet.near.org".into(),
                reason: "connection refused".into(),
            });
        let source = RefChainSource::new(Arc::new(mock), EXCHANGE);

        let err = source.ft_metadata("alice.near").await.unwrap_err();
        assert!(matches!(err, SwapError::NotFound { .. }));

        let err = source.ft_metadata("app.near").await.unwrap_err();
        assert!(matches!(err, SwapError::NotFound { .. }));

        let err = source.ft_metadata("flaky.near").await.unwrap_err();
        assert_eq!(err.error_code(), "upstream_unavailable");
    }

    #[tokio::test]
    async fn test_storage_registration() {
        let mock = MockViewCaller::new()
            .with_handler("usdt.tether-token.near", "storage_balance_of", |args| {
                Ok(if args["account_id"] == "alice.near" {
                    json!({"total": "1250000000000000000000", "available": "0"})
                } else {
                    Value::Null
                })
            })
            .with_error("slow.near", "storage_balance_of", || RpcError::Timeout {
                method: "query".into(),
                secs: 10,
            });
        let source = RefChainSource::new(Arc::new(mock), EXCHANGE);

        assert!(source.is_registered("usdt.tether-token.near", "alice.near").await.unwrap());
        assert!(!source.is_registered("usdt.tether-token.near", "bob.near").await.unwrap());
        let err = source.is_registered("slow.near", "alice.near").await.unwrap_err();
        assert!(matches!(err, SwapError::UpstreamTimeout { .. }));
    }
}

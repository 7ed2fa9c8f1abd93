//! near-rpc-client: JSON-RPC client for NEAR view calls
//!
//! Wraps `query` / `call_function` with request timeouts and result decoding.
//! Protocol crates depend on the [`ViewCaller`] trait so they can be driven
//! by an in-memory double in tests.

pub mod queries;

#[cfg(any(test, feature = "test-util"))]
pub mod mock;

use std::time::Duration;

use async_trait::async_trait;
use refhat_core::{RpcConfig, RpcError};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use queries::{decode_json_bytes, result_value_to_bytes, RpcRequest, RpcResponse};

#[cfg(any(test, feature = "test-util"))]
pub use mock::MockViewCaller;

/// Result type for RPC client operations
pub type Result<T> = std::result::Result<T, RpcError>;

/// Read-only contract calls
#[async_trait]
pub trait ViewCaller: Send + Sync {
    /// Call a view method and return the raw result bytes
    async fn view_bytes(&self, contract_id: &str, method_name: &str, args: Value)
        -> Result<Vec<u8>>;
}

/// Call a view method and deserialize its JSON result
pub async fn view_json<C, T>(caller: &C, contract_id: &str, method_name: &str, args: Value) -> Result<T>
where
    C: ViewCaller + ?Sized,
    T: DeserializeOwned,
{
    let bytes = caller.view_bytes(contract_id, method_name, args).await?;
    let value = decode_json_bytes(&bytes)?;
    serde_json::from_value(value).map_err(|e| {
        RpcError::ParseError(format!(
            "Unexpected {}.{} result shape: {}",
            contract_id, method_name, e
        ))
    })
}

/// NEAR JSON-RPC client
#[derive(Clone)]
pub struct NearRpcClient {
    http: reqwest::Client,
    config: RpcConfig,
}

impl NearRpcClient {
    /// Create a new client for the configured endpoint
    pub fn new(config: RpcConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| RpcError::Unreachable {
                url: config.url.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self { http, config })
    }

    /// Get the current RPC configuration
    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    async fn send(&self, request: &RpcRequest<'_>) -> Result<RpcResponse> {
        let response = self
            .http
            .post(&self.config.url)
            .json(request)
            .send()
            .await
            .map_err(|e| RpcError::Unreachable {
                url: self.config.url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.is_server_error() {
            return Err(RpcError::Unreachable {
                url: self.config.url.clone(),
                reason: format!("HTTP {}", status),
            });
        }

        response
            .json::<RpcResponse>()
            .await
            .map_err(|e| RpcError::ParseError(format!("Invalid RPC response: {}", e)))
    }
}

#[async_trait]
impl ViewCaller for NearRpcClient {
    async fn view_bytes(
        &self,
        contract_id: &str,
        method_name: &str,
        args: Value,
    ) -> Result<Vec<u8>> {
        let request = RpcRequest::call_function(contract_id, method_name, &args);
        tracing::debug!(contract = contract_id, method = method_name, "RPC view call");

        let response = timed_request(self.timeout(), method_name, self.send(&request)).await?;
        response.into_bytes()
    }
}

/// Run an RPC future under a deadline, mapping expiry to `RpcError::Timeout`
async fn timed_request<T>(
    timeout: Duration,
    method: &str,
    fut: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| RpcError::Timeout {
            method: method.to_string(),
            secs: timeout.as_secs(),
        })?
}

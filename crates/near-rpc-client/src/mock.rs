//! In-memory [`ViewCaller`] for tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use refhat_core::RpcError;
use serde_json::Value;

use crate::{Result, ViewCaller};

type Handler = Box<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// Canned view-call responses keyed by `(contract, method)`
#[derive(Default)]
pub struct MockViewCaller {
    handlers: HashMap<(String, String), Handler>,
    calls: Mutex<Vec<(String, String, Value)>>,
}

impl MockViewCaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always return `value` for this method
    pub fn with_response(self, contract_id: &str, method_name: &str, value: Value) -> Self {
        self.with_handler(contract_id, method_name, move |_| Ok(value.clone()))
    }

    /// Always fail this method with `error`
    pub fn with_error(
        self,
        contract_id: &str,
        method_name: &str,
        error: impl Fn() -> RpcError + Send + Sync + 'static,
    ) -> Self {
        self.with_handler(contract_id, method_name, move |_| Err(error()))
    }

    /// Compute the response from the call arguments
    pub fn with_handler(
        mut self,
        contract_id: &str,
        method_name: &str,
        handler: impl Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.handlers.insert(
            (contract_id.to_string(), method_name.to_string()),
            Box::new(handler),
        );
        self
    }

    /// Calls made so far, in order
    pub fn calls(&self) -> Vec<(String, String, Value)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of calls made to one method
    pub fn call_count(&self, contract_id: &str, method_name: &str) -> usize {
        self.calls()
            .iter()
            .filter(|(c, m, _)| c == contract_id && m == method_name)
            .count()
    }
}

#[async_trait]
impl ViewCaller for MockViewCaller {
    async fn view_bytes(
        &self,
        contract_id: &str,
        method_name: &str,
        args: Value,
    ) -> Result<Vec<u8>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((contract_id.to_string(), method_name.to_string(), args.clone()));
        }

        let handler = self
            .handlers
            .get(&(contract_id.to_string(), method_name.to_string()))
            .ok_or_else(|| RpcError::ApiError {
                message: format!("No mock response for {}.{}", contract_id, method_name),
            })?;

        let value = handler(&args)?;
        serde_json::to_vec(&value).map_err(|e| RpcError::ParseError(e.to_string()))
    }
}

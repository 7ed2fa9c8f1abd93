//! JSON-RPC envelopes for `query` / `call_function`

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use refhat_core::RpcError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC request body
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: &'static str,
    pub method: &'static str,
    pub params: CallFunctionParams<'a>,
}

/// Params for a `call_function` view query
#[derive(Debug, Clone, Serialize)]
pub struct CallFunctionParams<'a> {
    pub request_type: &'static str,
    pub finality: &'static str,
    pub account_id: &'a str,
    pub method_name: &'a str,
    pub args_base64: String,
}

impl<'a> RpcRequest<'a> {
    /// Build a `call_function` query against final state
    pub fn call_function(contract_id: &'a str, method_name: &'a str, args: &Value) -> Self {
        let args_json = serde_json::to_vec(args).unwrap_or_else(|_| b"{}".to_vec());
        Self {
            jsonrpc: "2.0",
            id: "dontcare",
            method: "query",
            params: CallFunctionParams {
                request_type: "call_function",
                finality: "final",
                account_id: contract_id,
                method_name,
                args_base64: BASE64.encode(args_json),
            },
        }
    }
}

/// JSON-RPC response body
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<CallResult>,
    #[serde(default)]
    pub error: Option<Value>,
}

/// `call_function` result
#[derive(Debug, Clone, Deserialize)]
pub struct CallResult {
    /// Raw return bytes, or an already-structured value on some providers
    #[serde(default)]
    pub result: Option<Value>,
    /// Execution error reported inside a successful RPC envelope
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub block_height: Option<u64>,
}

impl RpcResponse {
    /// Extract the return value bytes from the envelope
    pub fn into_bytes(self) -> Result<Vec<u8>, RpcError> {
        if let Some(error) = self.error {
            return Err(RpcError::ApiError {
                message: rpc_error_message(&error),
            });
        }

        let call = self.result.ok_or_else(|| {
            RpcError::ParseError("Response has neither result nor error".to_string())
        })?;

        if let Some(error) = call.error {
            return Err(RpcError::ApiError { message: error });
        }

        match call.result {
            Some(value) => result_value_to_bytes(value),
            None => Err(RpcError::ParseError(
                "call_function result is missing".to_string(),
            )),
        }
    }
}

/// Turn a `result.result` value into bytes.
///
/// Nodes return a byte array; anything else is taken as already-decoded JSON
/// and re-serialized.
pub fn result_value_to_bytes(value: Value) -> Result<Vec<u8>, RpcError> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|b| u8::try_from(b).ok())
                    .ok_or_else(|| RpcError::ParseError(format!("Invalid result byte: {}", item)))
            })
            .collect(),
        other => serde_json::to_vec(&other).map_err(|e| RpcError::ParseError(e.to_string())),
    }
}

/// Decode contract return bytes as UTF-8 JSON
pub fn decode_json_bytes(bytes: &[u8]) -> Result<Value, RpcError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| RpcError::ParseError(format!("Result is not UTF-8: {}", e)))?;
    serde_json::from_str(text)
        .map_err(|e| RpcError::ParseError(format!("Result is not JSON: {}", e)))
}

fn rpc_error_message(error: &Value) -> String {
    error
        .get("data")
        .and_then(Value::as_str)
        .or_else(|| error.get("message").and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string())
}

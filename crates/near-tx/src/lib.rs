//! near-tx: Unsigned transaction structures for NEAR wallets
//!
//! Defines the JSON shape wallets expect when asked to sign a batch of
//! function calls: `{signerId, receiverId, actions: [{type, params}]}`.

use refhat_core::{constants::TGAS, Gas, YoctoNear};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single contract method invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCallDescriptor {
    pub method_name: String,
    pub args: Map<String, Value>,
    /// Gas as a base-10 integer string
    pub gas: String,
    /// Attached deposit in yoctoNEAR as a base-10 integer string
    pub deposit: String,
}

impl FunctionCallDescriptor {
    pub fn new(
        method_name: impl Into<String>,
        args: Map<String, Value>,
        gas: Gas,
        deposit: YoctoNear,
    ) -> Self {
        Self {
            method_name: method_name.into(),
            args,
            gas: gas.to_string(),
            deposit: deposit.to_string(),
        }
    }

    /// Call with no arguments
    pub fn without_args(method_name: impl Into<String>, gas: Gas, deposit: YoctoNear) -> Self {
        Self::new(method_name, Map::new(), gas, deposit)
    }

    /// Get a string argument
    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(Value::as_str)
    }

    /// Same call with one argument replaced
    pub fn with_arg(&self, key: &str, value: Value) -> Self {
        let mut args = self.args.clone();
        args.insert(key.to_string(), value);
        Self {
            args,
            ..self.clone()
        }
    }
}

/// Wallet action wrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params")]
pub enum Action {
    FunctionCall(FunctionCallDescriptor),
}

impl Action {
    pub fn function_call(&self) -> &FunctionCallDescriptor {
        match self {
            Action::FunctionCall(call) => call,
        }
    }
}

impl From<FunctionCallDescriptor> for Action {
    fn from(call: FunctionCallDescriptor) -> Self {
        Action::FunctionCall(call)
    }
}

/// Unsigned transaction targeting one receiver contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEnvelope {
    pub signer_id: String,
    pub receiver_id: String,
    pub actions: Vec<Action>,
}

impl TransactionEnvelope {
    pub fn new(signer_id: impl Into<String>, receiver_id: impl Into<String>) -> Self {
        Self {
            signer_id: signer_id.into(),
            receiver_id: receiver_id.into(),
            actions: Vec::new(),
        }
    }

    /// Append a function call (builder style)
    pub fn call(mut self, call: FunctionCallDescriptor) -> Self {
        self.actions.push(call.into());
        self
    }

    /// Iterate the function calls in execution order
    pub fn function_calls(&self) -> impl Iterator<Item = &FunctionCallDescriptor> {
        self.actions.iter().map(Action::function_call)
    }

    /// Same envelope with its last function call replaced
    pub fn with_last_call(&self, call: FunctionCallDescriptor) -> Self {
        let mut actions = self.actions.clone();
        if let Some(last) = actions.last_mut() {
            *last = call.into();
        }
        Self {
            actions,
            ..self.clone()
        }
    }
}

/// Gas helper: `n` TGas
pub const fn tgas(n: u64) -> Gas {
    n * TGAS
}

/// Build an argument map from `(key, value)` pairs
pub fn args<I, K>(pairs: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_wire_format() {
        let envelope = TransactionEnvelope::new("alice.near", "wrap.near").call(
            FunctionCallDescriptor::without_args("near_deposit", tgas(50), 1_500_000),
        );

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({
                "signerId": "alice.near",
                "receiverId": "wrap.near",
                "actions": [{
                    "type": "FunctionCall",
                    "params": {
                        "methodName": "near_deposit",
                        "args": {},
                        "gas": "50000000000000",
                        "deposit": "1500000"
                    }
                }]
            })
        );
    }

    #[test]
    fn test_with_last_call_leaves_original_untouched() {
        let call = FunctionCallDescriptor::new(
            "ft_transfer_call",
            args([("msg", json!("a"))]),
            tgas(180),
            1,
        );
        let envelope = TransactionEnvelope::new("alice.near", "usdt.tether-token.near").call(call.clone());

        let patched = envelope.with_last_call(call.with_arg("msg", json!("b")));
        assert_eq!(envelope.function_calls().next().unwrap().arg_str("msg"), Some("a"));
        assert_eq!(patched.function_calls().next().unwrap().arg_str("msg"), Some("b"));
    }

    #[test]
    fn test_envelope_round_trips() {
        let json = json!({
            "signerId": "near",
            "receiverId": "wrap.near",
            "actions": [{"type": "FunctionCall", "params": {
                "methodName": "near_withdraw", "args": {"amount": "1"}, "gas": "1", "deposit": "1"
            }}]
        });
        let envelope: TransactionEnvelope = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(envelope.function_calls().next().unwrap().method_name, "near_withdraw");
        assert_eq!(serde_json::to_value(&envelope).unwrap(), json);
    }
}

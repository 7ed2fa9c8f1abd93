//! Swap Transaction Builder
//!
//! Turns a route into unsigned wallet transactions: an optional storage
//! registration on the output token, then one `ft_transfer_call` that sends
//! the input to the Ref exchange with the swap actions in its `msg`.
//!
//! Pure: no I/O, same inputs give byte-identical output.

use near_tx::{args, FunctionCallDescriptor, TransactionEnvelope};
use refhat_core::constants::ONE_YOCTO;
use refhat_core::u128_dec;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::calculator::apply_slippage;
use crate::constants::{deposits, gas};
use crate::router::split_paths;
use crate::state::{SwapError, SwapStep, Token};

/// One hop inside the exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapAction {
    pub pool_id: u64,
    pub token_in: String,
    pub token_out: String,
    /// Set on the first hop of each path; later hops consume the previous output
    #[serde(default, skip_serializing_if = "Option::is_none", with = "u128_dec::option")]
    pub amount_in: Option<u128>,
    #[serde(with = "u128_dec")]
    pub min_amount_out: u128,
}

/// `msg` payload of the `ft_transfer_call` into the exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapActionMessage {
    pub force: u8,
    pub actions: Vec<SwapAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral_id: Option<String>,
    /// When false the exchange unwraps a wrapped-NEAR output to native NEAR
    #[serde(default)]
    pub skip_unwrap_near: bool,
}

impl SwapActionMessage {
    /// Same message with unwrapping of the final output switched on
    pub fn with_unwrap(&self) -> Self {
        Self {
            skip_unwrap_near: false,
            ..self.clone()
        }
    }

    /// First pool the swap touches
    pub fn first_pool(&self) -> Option<u64> {
        self.actions.first().map(|a| a.pool_id)
    }

    pub fn to_msg(&self) -> Result<String, SwapError> {
        serde_json::to_string(self).map_err(|e| SwapError::BuildFailed(e.to_string()))
    }

    pub fn from_msg(msg: &str) -> Result<Self, SwapError> {
        serde_json::from_str(msg).map_err(|e| SwapError::BuildFailed(format!("Invalid swap msg: {}", e)))
    }
}

/// Everything the builder needs for one swap
#[derive(Debug, Clone)]
pub struct SwapBuildParams<'a> {
    pub token_in: &'a Token,
    pub token_out: &'a Token,
    /// Input in base units of `token_in`
    pub amount_in: u128,
    pub route: &'a [SwapStep],
    pub slippage_tolerance: f64,
    pub account_id: &'a str,
    pub referral_id: Option<&'a str>,
    pub exchange_id: &'a str,
    /// Whether the account still needs a storage registration on `token_out`
    pub register_output: bool,
}

/// Exchange actions for a route, in route order
pub fn swap_actions(route: &[SwapStep], slippage_tolerance: f64) -> Vec<SwapAction> {
    let mut actions = Vec::with_capacity(route.len());
    for path in split_paths(route) {
        let last = path.len() - 1;
        for (i, step) in path.iter().enumerate() {
            actions.push(SwapAction {
                pool_id: step.pool_id,
                token_in: step.token_in.clone(),
                token_out: step.token_out.clone(),
                amount_in: (i == 0).then_some(step.amount_in),
                min_amount_out: if i == last {
                    apply_slippage(step.estimate, slippage_tolerance)
                } else {
                    0
                },
            });
        }
    }
    actions
}

/// `storage_deposit` registering `account_id` on the output token
pub fn storage_deposit_transaction(account_id: &str, token_id: &str) -> TransactionEnvelope {
    TransactionEnvelope::new(account_id, token_id).call(FunctionCallDescriptor::new(
        "storage_deposit",
        args([
            ("account_id", json!(account_id)),
            ("registration_only", json!(true)),
        ]),
        gas::STORAGE_DEPOSIT,
        deposits::STORAGE_TO_REGISTER_WITH_FT,
    ))
}

/// Build the ordered transactions for a swap
pub fn build_swap_transactions(params: &SwapBuildParams<'_>) -> Result<Vec<TransactionEnvelope>, SwapError> {
    let route = params.route;
    if route.is_empty() {
        return Err(SwapError::BuildFailed("Route is empty".into()));
    }

    let paths = split_paths(route);
    for path in &paths {
        let (first, last) = (&path[0], &path[path.len() - 1]);
        if first.token_in != params.token_in.id || last.token_out != params.token_out.id {
            return Err(SwapError::BuildFailed(format!(
                "Route does not connect {} to {}",
                params.token_in.id, params.token_out.id
            )));
        }
    }
    let routed: u128 = paths.iter().map(|p| p[0].amount_in).sum();
    if routed != params.amount_in {
        return Err(SwapError::BuildFailed(format!(
            "Route spends {} but the input is {}",
            routed, params.amount_in
        )));
    }

    let msg = SwapActionMessage {
        force: 0,
        actions: swap_actions(route, params.slippage_tolerance),
        referral_id: params.referral_id.map(str::to_string),
        skip_unwrap_near: true,
    };

    let mut transactions = Vec::with_capacity(2);
    if params.register_output {
        transactions.push(storage_deposit_transaction(params.account_id, &params.token_out.id));
    }
    transactions.push(
        TransactionEnvelope::new(params.account_id, &params.token_in.id).call(FunctionCallDescriptor::new(
            "ft_transfer_call",
            args([
                ("receiver_id", json!(params.exchange_id)),
                ("amount", json!(params.amount_in.to_string())),
                ("msg", json!(msg.to_msg()?)),
            ]),
            gas::FT_TRANSFER_CALL,
            ONE_YOCTO,
        )),
    );

    Ok(transactions)
}

//! Native NEAR handling
//!
//! Ref only trades wrapped NEAR. A request touching native NEAR is either a
//! plain wrap/unwrap or a swap with a native leg, which gets a `near_deposit`
//! before the swap (native in) or has the exchange unwrap the output
//! (native out).

use near_tx::{args, FunctionCallDescriptor, TransactionEnvelope};
use refhat_core::constants::ONE_YOCTO;
use refhat_core::YoctoNear;
use serde_json::json;

use crate::constants::gas;
use crate::resolver::TokenMatch;
use crate::state::SwapError;
use crate::tx_builder::SwapActionMessage;

/// What a request does with native NEAR, decided once from both tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeMode {
    /// `near` → wrapped NEAR
    WrapOnly,
    /// wrapped NEAR → `near`
    UnwrapOnly,
    /// A swap where one side is native NEAR
    SwapWithNativeLeg { native_in: bool },
    /// A swap between two fungible tokens
    SwapNoNative,
}

impl NativeMode {
    /// Decide the mode; identical tokens are rejected here, before any I/O
    pub fn classify(token_in: &TokenMatch, token_out: &TokenMatch, wrap_near_id: &str) -> Result<Self, SwapError> {
        use crate::resolver::TokenMatch::{Contract, Native};

        match (token_in, token_out) {
            (Native, Native) => Err(SwapError::IdenticalTokens),
            (Contract(a), Contract(b)) if a == b => Err(SwapError::IdenticalTokens),
            (Native, Contract(id)) if id == wrap_near_id => Ok(Self::WrapOnly),
            (Contract(id), Native) if id == wrap_near_id => Ok(Self::UnwrapOnly),
            (Native, Contract(_)) => Ok(Self::SwapWithNativeLeg { native_in: true }),
            (Contract(_), Native) => Ok(Self::SwapWithNativeLeg { native_in: false }),
            (Contract(_), Contract(_)) => Ok(Self::SwapNoNative),
        }
    }
}

/// `near_deposit` wrapping `amount` yoctoNEAR
pub fn near_deposit_transaction(account_id: &str, wrap_near_id: &str, amount: YoctoNear) -> TransactionEnvelope {
    TransactionEnvelope::new(account_id, wrap_near_id).call(FunctionCallDescriptor::without_args(
        "near_deposit",
        gas::WRAP_NEAR,
        amount,
    ))
}

/// `near_withdraw` unwrapping `amount` yoctoNEAR
pub fn near_withdraw_transaction(account_id: &str, wrap_near_id: &str, amount: YoctoNear) -> TransactionEnvelope {
    TransactionEnvelope::new(account_id, wrap_near_id).call(FunctionCallDescriptor::new(
        "near_withdraw",
        args([("amount", json!(amount.to_string()))]),
        gas::WRAP_NEAR,
        ONE_YOCTO,
    ))
}

/// Insert `wrap` immediately before the final transaction
pub fn insert_before_last(transactions: Vec<TransactionEnvelope>, wrap: TransactionEnvelope) -> Vec<TransactionEnvelope> {
    let mut transactions = transactions;
    let at = transactions.len().saturating_sub(1);
    transactions.insert(at, wrap);
    transactions
}

/// Have the exchange unwrap the swap output: rebuild the last call's `msg`
/// with `skip_unwrap_near = false`.
pub fn enable_output_unwrap(transactions: Vec<TransactionEnvelope>) -> Result<Vec<TransactionEnvelope>, SwapError> {
    let mut transactions = transactions;
    let last = transactions
        .last()
        .ok_or_else(|| SwapError::BuildFailed("No transaction to unwrap".into()))?;
    let call = last
        .function_calls()
        .last()
        .ok_or_else(|| SwapError::BuildFailed("Last transaction has no function call".into()))?;
    let msg = call
        .arg_str("msg")
        .ok_or_else(|| SwapError::BuildFailed("Last call carries no swap msg".into()))?;

    let msg = SwapActionMessage::from_msg(msg)?.with_unwrap().to_msg()?;
    let patched = last.with_last_call(call.with_arg("msg", json!(msg)));

    let at = transactions.len() - 1;
    transactions[at] = patched;
    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx_builder::SwapAction;
    use refhat_core::constants::YOCTO_PER_NEAR;

    const WRAP: &str = "wrap.near";

    fn contract(id: &str) -> TokenMatch {
        TokenMatch::Contract(id.into())
    }

    fn swap_tx(skip_unwrap_near: bool) -> TransactionEnvelope {
        let msg = SwapActionMessage {
            force: 0,
            actions: vec![SwapAction {
                pool_id: 1,
                token_in: "usdt.tether-token.near".into(),
                token_out: WRAP.into(),
                amount_in: Some(5),
                min_amount_out: 4,
            }],
            referral_id: None,
            skip_unwrap_near,
        };
        TransactionEnvelope::new("alice.near", "usdt.tether-token.near").call(FunctionCallDescriptor::new(
            "ft_transfer_call",
            args([("msg", json!(msg.to_msg().unwrap()))]),
            180,
            1,
        ))
    }

    #[test]
    fn test_classify() {
        let usdt = contract("usdt.tether-token.near");
        let wrap = contract(WRAP);
        let native = TokenMatch::Native;

        assert_eq!(NativeMode::classify(&native, &wrap, WRAP).unwrap(), NativeMode::WrapOnly);
        assert_eq!(NativeMode::classify(&wrap, &native, WRAP).unwrap(), NativeMode::UnwrapOnly);
        assert_eq!(
            NativeMode::classify(&native, &usdt, WRAP).unwrap(),
            NativeMode::SwapWithNativeLeg { native_in: true }
        );
        assert_eq!(
            NativeMode::classify(&usdt, &native, WRAP).unwrap(),
            NativeMode::SwapWithNativeLeg { native_in: false }
        );
        assert_eq!(NativeMode::classify(&usdt, &wrap, WRAP).unwrap(), NativeMode::SwapNoNative);
    }

    #[test]
    fn test_identical_tokens() {
        let usdt = contract("usdt.tether-token.near");
        assert!(matches!(
            NativeMode::classify(&usdt, &usdt, WRAP),
            Err(SwapError::IdenticalTokens)
        ));
        assert!(matches!(
            NativeMode::classify(&TokenMatch::Native, &TokenMatch::Native, WRAP),
            Err(SwapError::IdenticalTokens)
        ));
        // Wrapped and native NEAR are distinct tokens
        assert!(NativeMode::classify(&contract(WRAP), &TokenMatch::Native, WRAP).is_ok());
    }

    #[test]
    fn test_wrap_and_unwrap_transactions() {
        let deposit = near_deposit_transaction("alice.near", WRAP, 2 * YOCTO_PER_NEAR);
        let call = deposit.function_calls().next().unwrap();
        assert_eq!(deposit.receiver_id, WRAP);
        assert_eq!(call.method_name, "near_deposit");
        assert!(call.args.is_empty());
        assert_eq!(call.deposit, "2000000000000000000000000");
        assert_eq!(call.gas, "50000000000000");

        let withdraw = near_withdraw_transaction("alice.near", WRAP, YOCTO_PER_NEAR);
        let call = withdraw.function_calls().next().unwrap();
        assert_eq!(call.method_name, "near_withdraw");
        assert_eq!(call.arg_str("amount"), Some("1000000000000000000000000"));
        assert_eq!(call.deposit, "1");
    }

    #[test]
    fn test_wrap_inserted_before_swap() {
        let storage = TransactionEnvelope::new("alice.near", "usdt.tether-token.near");
        let wrap = near_deposit_transaction("alice.near", WRAP, 1);
        let txs = insert_before_last(vec![storage.clone(), swap_tx(true)], wrap.clone());

        assert_eq!(txs.len(), 3);
        assert_eq!(txs[0], storage);
        assert_eq!(txs[1], wrap);
        assert_eq!(txs[2].receiver_id, "usdt.tether-token.near");
    }

    #[test]
    fn test_output_unwrap_rewrites_only_the_flag() {
        let original = swap_tx(true);
        let txs = enable_output_unwrap(vec![original.clone()]).unwrap();

        let call = txs[0].function_calls().next().unwrap();
        let msg = SwapActionMessage::from_msg(call.arg_str("msg").unwrap()).unwrap();
        assert!(!msg.skip_unwrap_near);

        let before = SwapActionMessage::from_msg(original.function_calls().next().unwrap().arg_str("msg").unwrap()).unwrap();
        assert_eq!(msg, before.with_unwrap());
        assert_eq!(call.gas, "180");
    }

    #[test]
    fn test_output_unwrap_requires_swap_msg() {
        let bare = near_deposit_transaction("alice.near", WRAP, 1);
        assert!(enable_output_unwrap(vec![bare]).is_err());
        assert!(enable_output_unwrap(vec![]).is_err());
    }
}

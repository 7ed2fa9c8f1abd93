//! HAT call builders
//!
//! Each builder returns a single wallet action; the caller picks the
//! receiver contract.

use near_tx::{args, Action, FunctionCallDescriptor};
use refhat_core::parse_units;
use serde_json::json;

use crate::constants::{deposits, gas, HAT_DECIMALS, INCREASE_DEPOSIT_MSG};
use crate::state::{AmountInput, HatError};

/// `ft_transfer_call` moving `amount` HAT into the vault
pub fn vault_deposit_call(vault_id: &str, amount: &AmountInput) -> Result<Action, HatError> {
    let input = amount.as_decimal();
    let base_units =
        parse_units(&input, HAT_DECIMALS).map_err(|_| HatError::InvalidAmount { input: input.clone() })?;

    let call = FunctionCallDescriptor::new(
        "ft_transfer_call",
        args([
            ("receiver_id", json!(vault_id)),
            ("amount", json!(base_units.to_string())),
            ("msg", json!(INCREASE_DEPOSIT_MSG)),
        ]),
        gas::VAULT_DEPOSIT,
        deposits::VAULT_DEPOSIT,
    );
    Ok(call.into())
}

pub fn claim_vault_call(index: u64) -> Action {
    FunctionCallDescriptor::new(
        "claim_vault",
        args([("index", json!(index))]),
        gas::CLAIM_VAULT,
        deposits::CLAIM_VAULT,
    )
    .into()
}

pub fn start_or_place_bid_call() -> Action {
    FunctionCallDescriptor::without_args("start_or_place_bid", gas::PLACE_BID, deposits::PLACE_BID).into()
}

pub fn claim_tokens_call() -> Action {
    FunctionCallDescriptor::without_args("claim_tokens", gas::CLAIM_TOKENS, deposits::CLAIM_TOKENS).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Number;

    #[test]
    fn test_vault_deposit_call_shape() {
        let action = vault_deposit_call(
            "diamondvault.hat-coin.near",
            &AmountInput::Text("2.5".into()),
        )
        .unwrap();

        assert_eq!(
            serde_json::to_value(&action).unwrap(),
            json!({
                "type": "FunctionCall",
                "params": {
                    "methodName": "ft_transfer_call",
                    "args": {
                        "receiver_id": "diamondvault.hat-coin.near",
                        "amount": "2500000000000000000",
                        "msg": "{\"action_to_execute\":\"increase_deposit\"}"
                    },
                    "gas": "200000000000000",
                    "deposit": "1"
                }
            })
        );
    }

    #[test]
    fn test_vault_deposit_accepts_json_numbers() {
        let action = vault_deposit_call("vault.near", &AmountInput::Number(Number::from(3))).unwrap();
        assert_eq!(action.function_call().arg_str("amount"), Some("3000000000000000000"));
    }

    #[test]
    fn test_vault_deposit_rejects_bad_amounts() {
        for input in ["-1", "abc", "1e3", "", "0", "0.0000000000000000001"] {
            let err = vault_deposit_call("vault.near", &AmountInput::Text(input.into())).unwrap_err();
            assert!(matches!(err, HatError::InvalidAmount { .. }), "{}", input);
        }
    }

    #[test]
    fn test_fixed_calls() {
        let claim = claim_vault_call(4);
        assert_eq!(claim.function_call().args["index"], json!(4));
        assert_eq!(claim.function_call().gas, "30000000000000");
        assert_eq!(claim.function_call().deposit, "0");

        let bid = start_or_place_bid_call();
        assert_eq!(bid.function_call().method_name, "start_or_place_bid");
        assert_eq!(bid.function_call().deposit, "1");
        assert!(bid.function_call().args.is_empty());

        let tokens = claim_tokens_call();
        assert_eq!(tokens.function_call().gas, "300000000000000");
        assert_eq!(tokens.function_call().deposit, "10000000000000000000");
    }
}

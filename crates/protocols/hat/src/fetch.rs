//! HAT chain reads
//!
//! Balance, vault and auction views through NEAR RPC.

use std::sync::Arc;

use near_rpc_client::{view_json, ViewCaller};
use refhat_core::{is_valid_account_id, u128_dec, units_to_f64, ContractsConfig};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::constants::HAT_DECIMALS;
use crate::state::{AuctionView, BalanceView, HatError, LastVaultView, RawAuction};

/// HAT token, vault and auction contract ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HatContracts {
    pub hat_token: String,
    pub vault: String,
    pub auction: String,
}

impl HatContracts {
    pub fn from_config(contracts: &ContractsConfig) -> Self {
        Self {
            hat_token: contracts.hat_token.clone(),
            vault: contracts.vault.clone(),
            auction: contracts.auction.clone(),
        }
    }
}

impl Default for HatContracts {
    fn default() -> Self {
        Self::from_config(&ContractsConfig::default())
    }
}

#[derive(Deserialize)]
struct Balance(#[serde(with = "u128_dec")] u128);

/// Reads HAT contract state
#[derive(Clone)]
pub struct HatClient {
    caller: Arc<dyn ViewCaller>,
    contracts: HatContracts,
}

impl HatClient {
    pub fn new(caller: Arc<dyn ViewCaller>, contracts: HatContracts) -> Self {
        Self { caller, contracts }
    }

    pub fn contracts(&self) -> &HatContracts {
        &self.contracts
    }

    /// HAT balance of `account_id` in whole tokens
    pub async fn ft_balance_of(&self, account_id: &str) -> Result<BalanceView, HatError> {
        if !is_valid_account_id(account_id) {
            return Err(HatError::InvalidRequest(format!(
                "account_id {} is not a valid NEAR account",
                account_id
            )));
        }

        let Balance(raw) = view_json(
            self.caller.as_ref(),
            &self.contracts.hat_token,
            "ft_balance_of",
            json!({ "account_id": account_id }),
        )
        .await?;

        debug!(account = account_id, raw = %raw, "HAT balance");
        Ok(BalanceView {
            balance: units_to_f64(raw, HAT_DECIMALS),
        })
    }

    /// Most recent vault with display conversions applied
    pub async fn last_vault(&self) -> Result<LastVaultView, HatError> {
        let value: Value =
            view_json(self.caller.as_ref(), &self.contracts.vault, "get_last_vault", json!({})).await?;
        Ok(LastVaultView::from_value(value))
    }

    /// Current auction with display conversions applied
    pub async fn auction_info(&self) -> Result<AuctionView, HatError> {
        let value: Value = view_json(
            self.caller.as_ref(),
            &self.contracts.auction,
            "get_auction_info",
            json!({}),
        )
        .await?;

        let raw: RawAuction = serde_json::from_value(value).map_err(|e| {
            warn!(error = %e, "Unexpected auction shape");
            HatError::InvalidResponse { what: "auction" }
        })?;
        Ok(raw.into())
    }
}

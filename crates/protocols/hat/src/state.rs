//! HAT State Types
//!
//! Raw contract views, their display forms, request bodies and errors.

use chrono::{TimeZone, Utc};
use refhat_core::constants::NEAR_DECIMALS;
use refhat_core::{u128_dec, units_to_f64, RpcError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::constants::HAT_DECIMALS;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Render a nanosecond timestamp as a UTC date
pub fn format_timestamp_ns(ns: u128) -> Option<String> {
    let secs = i64::try_from(ns / NANOS_PER_SEC).ok()?;
    let nanos = (ns % NANOS_PER_SEC) as u32;
    Utc.timestamp_opt(secs, nanos)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

/// `{balance}` in whole HAT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceView {
    pub balance: f64,
}

/// Vault record from `get_last_vault`
#[derive(Debug, Clone, Deserialize)]
pub struct RawVault {
    #[serde(default, with = "u128_dec::option")]
    pub token_amount: Option<u128>,
    #[serde(default, with = "u128_dec::option")]
    pub token_amount_complete: Option<u128>,
    /// Nanoseconds since epoch
    #[serde(default, with = "u128_dec::option")]
    pub date_start: Option<u128>,
    #[serde(default, with = "u128_dec::option")]
    pub date_end: Option<u128>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Vault with amounts in whole HAT and formatted dates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VaultView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_amount_complete: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_end: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<RawVault> for VaultView {
    fn from(raw: RawVault) -> Self {
        Self {
            token_amount: raw.token_amount.map(|v| units_to_f64(v, HAT_DECIMALS)),
            token_amount_complete: raw.token_amount_complete.map(|v| units_to_f64(v, HAT_DECIMALS)),
            date_start: raw.date_start.and_then(format_timestamp_ns),
            date_end: raw.date_end.and_then(format_timestamp_ns),
            extra: raw.extra,
        }
    }
}

/// `get_last_vault` result: `[index, vault]`, or whatever the contract
/// returned when there is no vault yet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LastVaultView {
    Indexed(u64, VaultView),
    Raw(Value),
}

impl LastVaultView {
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value::<(u64, RawVault)>(value.clone()) {
            Ok((index, vault)) => Self::Indexed(index, vault.into()),
            Err(_) => Self::Raw(value),
        }
    }
}

/// Auction record from `get_auction_info`
#[derive(Debug, Clone, Deserialize)]
pub struct RawAuction {
    #[serde(default, with = "u128_dec::option")]
    pub start_time: Option<u128>,
    #[serde(default, with = "u128_dec::option")]
    pub end_time: Option<u128>,
    /// yoctoNEAR
    #[serde(default, with = "u128_dec::option")]
    pub highest_bid: Option<u128>,
    /// Internal bookkeeping, never shown
    #[serde(default)]
    pub highest_bid_temp: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Auction with formatted times and the bid in NEAR
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuctionView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_bid: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<RawAuction> for AuctionView {
    fn from(raw: RawAuction) -> Self {
        Self {
            start_time: raw.start_time.and_then(format_timestamp_ns),
            end_time: raw.end_time.and_then(format_timestamp_ns),
            highest_bid: raw.highest_bid.map(|v| units_to_f64(v, NEAR_DECIMALS)),
            extra: raw.extra,
        }
    }
}

/// Amount in a request body: a JSON number or a decimal string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(serde_json::Number),
    Text(String),
}

impl AmountInput {
    pub fn as_decimal(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

/// Body of `POST /ft_transfer_call`
#[derive(Debug, Clone, Deserialize)]
pub struct VaultDepositRequest {
    pub amount: AmountInput,
}

/// Body of `POST /claim_vault`
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimVaultRequest {
    pub index: u64,
}

/// HAT operation errors
#[derive(Debug, Error)]
pub enum HatError {
    #[error("Invalid amount provided. It should be a valid positive number.")]
    InvalidAmount { input: String },

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Upstream unavailable: {reason}")]
    UpstreamUnavailable { reason: String },

    #[error("Upstream timed out: {reason}")]
    UpstreamTimeout { reason: String },

    #[error("Error processing {what} response")]
    InvalidResponse { what: &'static str },
}

impl HatError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::InvalidRequest(_) => "invalid_request",
            Self::UpstreamUnavailable { .. } => "upstream_unavailable",
            Self::UpstreamTimeout { .. } => "upstream_timeout",
            Self::InvalidResponse { .. } => "invalid_response",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount { .. } | Self::InvalidRequest(_) => 400,
            Self::UpstreamTimeout { .. } => 408,
            Self::UpstreamUnavailable { .. } | Self::InvalidResponse { .. } => 424,
        }
    }
}

impl From<RpcError> for HatError {
    fn from(err: RpcError) -> Self {
        if err.is_timeout() {
            Self::UpstreamTimeout {
                reason: err.to_string(),
            }
        } else {
            Self::UpstreamUnavailable {
                reason: err.to_string(),
            }
        }
    }
}

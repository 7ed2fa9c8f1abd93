//! Error types for Refhat

use thiserror::Error;

/// Core errors that can occur in Refhat
#[derive(Debug, Error)]
pub enum Error {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Amount error: {0}")]
    Amount(#[from] AmountError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Chain RPC errors
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("RPC unreachable at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("RPC request {method} timed out after {secs}s")]
    Timeout { method: String, secs: u64 },

    #[error("RPC returned error: {message}")]
    ApiError { message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl RpcError {
    /// Whether the upstream was too slow rather than unreachable or broken
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Human amount parsing errors
#[derive(Debug, Error)]
pub enum AmountError {
    #[error("Invalid amount '{input}'. It should be a valid positive number")]
    Malformed { input: String },

    #[error("Amount must be greater than zero")]
    NonPositive,

    #[error("Amount '{input}' has more than {decimals} decimal places")]
    TooManyDecimals { input: String, decimals: u8 },

    #[error("Amount '{input}' is too large")]
    Overflow { input: String },
}

/// Result type alias for Refhat operations
pub type Result<T> = std::result::Result<T, Error>;

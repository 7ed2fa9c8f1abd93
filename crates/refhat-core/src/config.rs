//! Configuration types for Refhat

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_ACCOUNT_ID;
use crate::Error;

/// Default maximum hops for smart routing
pub const DEFAULT_MAX_HOPS: usize = 3;

/// Upper bound accepted for configured hops
pub const MAX_HOPS_LIMIT: usize = 4;

/// Chain RPC connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// JSON-RPC endpoint (e.g., "https://rpc.mainnet.near.org")
    #[serde(default = "default_rpc_url")]
    pub url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_rpc_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_rpc_url() -> String {
    "https://rpc.mainnet.near.org".to_string()
}

fn default_rpc_timeout_secs() -> u64 {
    10
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            timeout_secs: default_rpc_timeout_secs(),
        }
    }
}

/// On-chain contract IDs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractsConfig {
    /// Ref Finance exchange contract
    #[serde(default = "default_ref_exchange")]
    pub ref_exchange: String,
    /// Wrapped NEAR token contract
    #[serde(default = "default_wrap_near")]
    pub wrap_near: String,
    /// HAT fungible token contract
    #[serde(default = "default_hat_token")]
    pub hat_token: String,
    /// Diamond vault contract
    #[serde(default = "default_vault")]
    pub vault: String,
    /// HAT auction contract
    #[serde(default = "default_auction")]
    pub auction: String,
}

fn default_ref_exchange() -> String {
    "v2.ref-finance.near".to_string()
}

fn default_wrap_near() -> String {
    "wrap.near".to_string()
}

fn default_hat_token() -> String {
    "hat.tkn.near".to_string()
}

fn default_vault() -> String {
    "diamondvault.hat-coin.near".to_string()
}

fn default_auction() -> String {
    "auctions.hat-coin.near".to_string()
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            ref_exchange: default_ref_exchange(),
            wrap_near: default_wrap_near(),
            hat_token: default_hat_token(),
            vault: default_vault(),
            auction: default_auction(),
        }
    }
}

/// Additional token registry entry for fuzzy lookups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenListEntry {
    pub id: String,
    pub name: String,
    pub symbol: String,
}

/// Swap pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapConfig {
    /// Referral account stamped into swap messages
    #[serde(default = "default_referral_id")]
    pub referral_id: Option<String>,

    /// Slippage tolerance as a fraction (0.05 = 5%)
    #[serde(default = "default_slippage_tolerance")]
    pub slippage_tolerance: f64,

    /// Try multi-hop routing before falling back to direct simple pools
    #[serde(default = "default_true")]
    pub enable_smart_routing: bool,

    /// Maximum hops for smart routing
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,

    /// Signer used when the request carries no account
    #[serde(default = "default_account_id")]
    pub default_account_id: String,

    /// Tokens appended to the built-in registry
    #[serde(default)]
    pub extra_tokens: Vec<TokenListEntry>,
}

fn default_referral_id() -> Option<String> {
    Some("mintbase.near".to_string())
}

fn default_slippage_tolerance() -> f64 {
    0.05
}

fn default_true() -> bool {
    true
}

fn default_max_hops() -> usize {
    DEFAULT_MAX_HOPS
}

fn default_account_id() -> String {
    DEFAULT_ACCOUNT_ID.to_string()
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            referral_id: default_referral_id(),
            slippage_tolerance: default_slippage_tolerance(),
            enable_smart_routing: true,
            max_hops: default_max_hops(),
            default_account_id: default_account_id(),
            extra_tokens: Vec::new(),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Whole-request deadline in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    3000
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            api_port: default_api_port(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// RPC connection settings
    #[serde(default)]
    pub rpc: RpcConfig,

    /// Contract IDs
    #[serde(default)]
    pub contracts: ContractsConfig,

    /// Swap settings
    #[serde(default)]
    pub swap: SwapConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from a JSON file. Missing fields use defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json_str(&raw)
    }

    /// Parse configuration from a JSON string and validate it
    pub fn from_json_str(raw: &str) -> crate::Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| Error::Config(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the swap pipeline can't work with
    pub fn validate(&self) -> crate::Result<()> {
        let slippage = self.swap.slippage_tolerance;
        if !(0.0..1.0).contains(&slippage) {
            return Err(Error::Config(format!(
                "slippage_tolerance must be in [0, 1), got {}",
                slippage
            )));
        }
        if !(1..=MAX_HOPS_LIMIT).contains(&self.swap.max_hops) {
            return Err(Error::Config(format!(
                "max_hops must be between 1 and {}, got {}",
                MAX_HOPS_LIMIT, self.swap.max_hops
            )));
        }
        if self.rpc.timeout_secs == 0 || self.server.request_timeout_secs == 0 {
            return Err(Error::Config("timeouts must be non-zero".to_string()));
        }
        Ok(())
    }
}

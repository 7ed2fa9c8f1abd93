//! Application state shared across API handlers

use std::sync::Arc;
use std::time::Duration;

use hat::{HatClient, HatContracts};
use near_rpc_client::{NearRpcClient, ViewCaller};
use ref_swap::{RefChainSource, SwapService, SwapSettings, TokenRegistry};
use refhat_core::AppConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    swap: SwapService,
    hat: HatClient,
}

impl AppState {
    /// State reading the chain through `caller`
    pub fn with_caller(config: AppConfig, caller: Arc<dyn ViewCaller>) -> Self {
        let source = Arc::new(RefChainSource::new(caller.clone(), config.contracts.ref_exchange.clone()));
        let registry = TokenRegistry::builtin().with_extra(&config.swap.extra_tokens);
        let swap = SwapService::from_chain(source, registry, SwapSettings::from_config(&config));
        let hat = HatClient::new(caller, HatContracts::from_config(&config.contracts));

        Self {
            inner: Arc::new(AppStateInner { config, swap, hat }),
        }
    }

    /// State backed by the configured NEAR RPC endpoint
    pub fn from_config(config: AppConfig) -> refhat_core::Result<Self> {
        config.validate()?;
        tracing::info!("Creating NEAR RPC client for URL: {}", config.rpc.url);
        let client = NearRpcClient::new(config.rpc.clone())?;
        Ok(Self::with_caller(config, Arc::new(client)))
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn swap(&self) -> &SwapService {
        &self.inner.swap
    }

    pub fn hat(&self) -> &HatClient {
        &self.inner.hat
    }

    /// Deadline for a whole request's upstream work
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.inner.config.server.request_timeout_secs)
    }
}

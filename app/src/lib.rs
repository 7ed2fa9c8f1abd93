//! Refhat server application library

use std::path::Path;

use anyhow::Context;
use refhat_api::AppState;
use refhat_core::AppConfig;

const DEFAULT_LOG_FILTER: &str = "info,refhat_lib=debug,refhat_api=debug,ref_swap=debug,hat=debug,tower_http=debug";

/// Install the global tracing subscriber; `RUST_LOG` overrides the default filter
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Configuration from `path`, or built-in defaults
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(AppConfig::default()),
    }
}

/// Run the API server until it stops
pub async fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    tracing::info!(
        rpc = %config.rpc.url,
        exchange = %config.contracts.ref_exchange,
        smart_routing = config.swap.enable_smart_routing,
        "Starting Refhat"
    );

    let state = AppState::from_config(config).context("building application state")?;
    refhat_api::start_server(state).await.context("API server failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_defaults_without_path() {
        let config = load_config(None).unwrap();
        assert_eq!(config.server.api_port, 3000);
    }

    #[test]
    fn test_load_config_reports_missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/refhat.json"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/refhat.json"));
    }
}

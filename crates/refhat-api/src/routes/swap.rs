//! Swap and token lookup endpoints

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use near_tx::TransactionEnvelope;
use ref_swap::SwapError;
use refhat_core::is_valid_account_id;

use super::{error_response, within, ApiResult};
use crate::dto::{ApiError, MbMetadata, TokenResponse};
use crate::AppState;

const MB_METADATA_HEADER: &str = "mb-metadata";

/// Create swap routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/swap/:token_in/:token_out/:quantity", get(build_swap))
        .route("/:token", get(token_metadata))
}

fn swap_error(e: SwapError) -> (StatusCode, Json<ApiError>) {
    error_response(e.status_code(), e.error_code(), e.to_string())
}

/// Account from the `mb-metadata` header, or the configured default
fn caller_account(headers: &HeaderMap, default_account: &str) -> String {
    headers
        .get(MB_METADATA_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| serde_json::from_str::<MbMetadata>(raw).ok())
        .and_then(|meta| meta.account_id)
        .filter(|id| is_valid_account_id(id))
        .unwrap_or_else(|| default_account.to_string())
}

/// GET /api/swap/:token_in/:token_out/:quantity - Unsigned swap transactions
pub async fn build_swap(
    State(state): State<AppState>,
    Path((token_in, token_out, quantity)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> ApiResult<Vec<TransactionEnvelope>> {
    let account_id = caller_account(&headers, &state.config().swap.default_account_id);

    let transactions = within(
        state.request_timeout(),
        state.swap().build_swap(&token_in, &token_out, &quantity, &account_id),
        |reason| SwapError::UpstreamTimeout { reason },
    )
    .await
    .map_err(|e| {
        tracing::info!(%token_in, %token_out, %quantity, code = e.error_code(), "Swap request failed: {}", e);
        swap_error(e)
    })?;

    Ok(Json(transactions))
}

/// GET /api/:token - Token metadata
pub async fn token_metadata(State(state): State<AppState>, Path(token): Path<String>) -> ApiResult<TokenResponse> {
    let resolved = within(
        state.request_timeout(),
        state.swap().token_metadata(&token),
        |reason| SwapError::UpstreamTimeout { reason },
    )
    .await
    .map_err(|e| match e {
        SwapError::NotFound { .. } => error_response(404, e.error_code(), format!("Token {} not found", token)),
        other => swap_error(other),
    })?;

    Ok(Json(resolved.into()))
}

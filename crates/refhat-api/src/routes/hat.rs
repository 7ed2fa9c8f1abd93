//! HAT vault and auction endpoints

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use hat::{
    claim_tokens_call, claim_vault_call, start_or_place_bid_call, vault_deposit_call, AuctionView, BalanceView,
    ClaimVaultRequest, HatError, LastVaultView, VaultDepositRequest,
};
use near_tx::Action;

use super::{error_response, within, ApiResult};
use crate::dto::{ApiError, BalanceQuery};
use crate::AppState;

/// Create HAT routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ft_balance_of", get(ft_balance_of))
        .route("/get_last_vault", get(get_last_vault))
        .route("/get_auction_info", get(get_auction_info))
        .route("/ft_transfer_call", post(ft_transfer_call))
        .route("/claim_vault", post(claim_vault))
        .route("/start_or_place_bid", post(start_or_place_bid))
        .route("/claim_tokens", post(claim_tokens))
}

fn hat_error(e: HatError) -> (StatusCode, Json<ApiError>) {
    error_response(e.status_code(), e.error_code(), e.to_string())
}

/// GET /api/ft_balance_of?account_id= - HAT balance in whole tokens
pub async fn ft_balance_of(
    State(state): State<AppState>,
    query: Result<Query<BalanceQuery>, QueryRejection>,
) -> ApiResult<BalanceView> {
    let Query(query) =
        query.map_err(|_| hat_error(HatError::InvalidRequest("account_id must be a string".into())))?;

    let balance = within(
        state.request_timeout(),
        state.hat().ft_balance_of(&query.account_id),
        |reason| HatError::UpstreamTimeout { reason },
    )
    .await
    .map_err(hat_error)?;

    Ok(Json(balance))
}

/// GET /api/get_last_vault - Latest vault
pub async fn get_last_vault(State(state): State<AppState>) -> ApiResult<LastVaultView> {
    let vault = within(state.request_timeout(), state.hat().last_vault(), |reason| {
        HatError::UpstreamTimeout { reason }
    })
    .await
    .map_err(hat_error)?;

    Ok(Json(vault))
}

/// GET /api/get_auction_info - Current auction
pub async fn get_auction_info(State(state): State<AppState>) -> ApiResult<AuctionView> {
    let auction = within(state.request_timeout(), state.hat().auction_info(), |reason| {
        HatError::UpstreamTimeout { reason }
    })
    .await
    .map_err(hat_error)?;

    Ok(Json(auction))
}

/// POST /api/ft_transfer_call - Deposit HAT into the vault
pub async fn ft_transfer_call(
    State(state): State<AppState>,
    body: Result<Json<VaultDepositRequest>, JsonRejection>,
) -> ApiResult<Action> {
    let Json(request) = body.map_err(|e| {
        hat_error(HatError::InvalidAmount {
            input: e.body_text(),
        })
    })?;

    let action = vault_deposit_call(&state.hat().contracts().vault, &request.amount).map_err(hat_error)?;
    Ok(Json(action))
}

/// POST /api/claim_vault - Claim a vault by index
pub async fn claim_vault(body: Result<Json<ClaimVaultRequest>, JsonRejection>) -> ApiResult<Action> {
    let Json(request) =
        body.map_err(|_| hat_error(HatError::InvalidRequest("index must be a number".into())))?;
    Ok(Json(claim_vault_call(request.index)))
}

/// POST /api/start_or_place_bid - Start an auction or outbid the current bid
pub async fn start_or_place_bid() -> Json<Action> {
    Json(start_or_place_bid_call())
}

/// POST /api/claim_tokens - Claim tokens won at auction
pub async fn claim_tokens() -> Json<Action> {
    Json(claim_tokens_call())
}

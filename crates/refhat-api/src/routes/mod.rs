//! API route handlers

pub mod hat;
pub mod health;
pub mod swap;

use std::future::Future;
use std::time::Duration;

use axum::{http::StatusCode, routing::get, Json, Router};

use crate::dto::ApiError;
use crate::AppState;

/// Handler result carrying a JSON error body on failure
pub type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", hat::router().merge(swap::router()))
        .with_state(state)
}

pub(crate) fn error_response(status: u16, code: &str, message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ApiError::new(code, message)),
    )
}

/// Run a handler's upstream work under the request deadline
pub(crate) async fn within<T, E>(
    limit: Duration,
    fut: impl Future<Output = Result<T, E>>,
    on_timeout: impl FnOnce(String) -> E,
) -> Result<T, E> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| on_timeout(format!("request exceeded {}s", limit.as_secs())))?
}

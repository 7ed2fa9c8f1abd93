//! Data Transfer Objects for API requests and responses

use serde::{Deserialize, Serialize};

use ref_swap::Token;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Token metadata as returned by `GET /api/{token}`.
///
/// Icons are data URIs that can run to tens of kilobytes, so the field is
/// always sent empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub icon: String,
}

impl From<Token> for TokenResponse {
    fn from(token: Token) -> Self {
        Self {
            id: token.id,
            name: token.name,
            symbol: token.symbol,
            decimals: token.decimals,
            icon: String::new(),
        }
    }
}

/// Query of `GET /api/ft_balance_of`
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceQuery {
    pub account_id: String,
}

/// Optional `mb-metadata` header carrying the caller's account
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MbMetadata {
    pub account_id: Option<String>,
}

/// Generic API error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_response_blanks_icon() {
        let token = Token {
            id: "wrap.near".into(),
            name: "Wrapped NEAR fungible token".into(),
            symbol: "wNEAR".into(),
            decimals: 24,
            icon: Some("data:image/svg+xml;base64,AAAA".into()),
        };
        let body = serde_json::to_value(TokenResponse::from(token)).unwrap();
        assert_eq!(body["icon"], json!(""));
        assert_eq!(body["decimals"], json!(24));
    }

    #[test]
    fn test_api_error_shape() {
        let body = serde_json::to_value(ApiError::new("not_found", "Token foo not found")).unwrap();
        assert_eq!(body, json!({"error": "Token foo not found", "code": "not_found"}));
    }
}

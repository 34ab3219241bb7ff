//! Shared API request/response types

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ========================================
// Account Types
// ========================================

/// POST /register body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// POST /token form body (OAuth2 password-flow field names)
///
/// `username` carries the account email.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Issued bearer token
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: i64,
}

impl TokenResponse {
    pub fn bearer(access_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            expires_in,
        }
    }
}

// ========================================
// Error Response Types
// ========================================

/// JSON error body returned by every failing endpoint
///
/// # Examples
///
/// ```
/// use wxmc_common::api::types::ErrorResponse;
///
/// let error = ErrorResponse::new("invalid_horizon", "Invalid horizon: -1 (must be >= 0)");
/// assert!(error.details.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

// Error handling module
// Internal error taxonomy and the generic boundary response

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors raised while obtaining tokens or talking to Strava.
///
/// These carry upstream detail (status codes, response bodies) and must never
/// be rendered to a client directly. Convert with [`ApiError::into_public`].
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed startup configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Token endpoint rejected the refresh-token exchange
    #[error("Token refresh failed: {status} - {message}")]
    TokenRefresh { status: u16, message: String },

    /// Data endpoint returned a non-success status or an unexpected body
    #[error("Strava API error: {status} - {message}")]
    UpstreamRequest { status: u16, message: String },

    /// Transport failures and anything else without a better home
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Short classification used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::ConfigError(_) => "config",
            ApiError::TokenRefresh { .. } => "token_refresh",
            ApiError::UpstreamRequest { .. } => "upstream",
            ApiError::Internal(_) => "internal",
        }
    }

    /// Log the full error and replace it with a generic message for the caller.
    pub fn into_public(self, message: &'static str) -> PublicError {
        let error_id = uuid::Uuid::new_v4().to_string()[..8].to_string();
        tracing::error!(
            error_id = %error_id,
            kind = self.kind(),
            error = ?self,
            "{}",
            message
        );
        PublicError::new(message)
    }
}

/// Caller-visible failure: always HTTP 500 with `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicError {
    message: &'static str,
}

impl PublicError {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }

    pub fn message(&self) -> &'static str {
        self.message
    }
}

impl IntoResponse for PublicError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// Result type alias for Strava operations
pub type Result<T> = std::result::Result<T, ApiError>;

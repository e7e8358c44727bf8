//! Error type for the mock backend.
//!
//! [`MockError`] implements [`IntoResponse`] so handlers can return
//! `Result<…, MockError>` directly. Every error body is `{"error": "…"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Failure modes of the mock endpoints.
#[derive(Debug, thiserror::Error)]
pub enum MockError {
    /// Unknown login or wrong password hash.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The account exists but may not log in.
    #[error("account {0} is locked")]
    Locked(String),

    /// No bearer token, or a token that fails verification.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but the operation needs administration rights.
    #[error("administrator rights required")]
    Forbidden,

    /// The addressed resource does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A unique attribute is already taken.
    #[error("{0} already exists")]
    Conflict(String),

    /// The token lifetime pushes the expiry out of the representable range.
    #[error("token lifetime {0} is out of range")]
    TokenLifetime(chrono::Duration),

    /// Token signing failed.
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidCredentials | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Locked(_) | Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::TokenLifetime(_) | Self::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = self.to_string();

        tracing::warn!(%status, error = %message, "request failed");
        (status, Json(json!({ "error": message }))).into_response()
    }
}

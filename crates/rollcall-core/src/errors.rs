//! Application error taxonomy.
//!
//! Every failure a request can hit maps to one of these variants, and every
//! variant maps to a single HTTP status and a `{"error": "..."}` JSON body.
//! Token verification failures are deliberately collapsed into
//! [`AppError::TokenInvalid`] so callers cannot distinguish a bad signature
//! from an expired or malformed token.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Typed application error.
///
/// Security-relevant variants are user-facing and never silently swallowed;
/// store failures surface as [`AppError::Database`] and render as a generic
/// 500 without leaking the underlying error text.
#[derive(Debug, Error)]
pub enum AppError {
    /// No credential was presented where one is required.
    #[error("Authentication token missing")]
    TokenMissing,

    /// Signature, expiry, or shape of the access token failed verification.
    #[error("Invalid or expired token")]
    TokenInvalid,

    /// The account behind an otherwise valid credential is not active.
    #[error("Account is not active")]
    AccountInactive,

    /// The presented session token matches no usable session.
    #[error("Session is invalid or expired")]
    SessionInvalidOrExpired,

    /// Device binding or another session integrity check failed.
    #[error("Session security check failed")]
    SecurityViolation,

    /// A superseded refresh token was replayed inside the reuse window.
    #[error("Session token reuse detected")]
    ReuseDetected,

    /// Authenticated, but the role is not allowed on this surface.
    #[error("Access denied")]
    Forbidden,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Validation(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::TokenMissing
            | Self::TokenInvalid
            | Self::SessionInvalidOrExpired
            | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::AccountInactive
            | Self::SecurityViolation
            | Self::ReuseDetected
            | Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let message = match &self {
            // Never leak driver-level detail to the client.
            Self::Database(_) => "Internal server error".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({ "error": message }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_variants() {
        for err in [
            AppError::TokenMissing,
            AppError::TokenInvalid,
            AppError::SessionInvalidOrExpired,
            AppError::InvalidCredentials,
        ] {
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_forbidden_variants() {
        for err in [
            AppError::AccountInactive,
            AppError::SecurityViolation,
            AppError::ReuseDetected,
            AppError::Forbidden,
        ] {
            assert_eq!(err.status(), StatusCode::FORBIDDEN);
        }
    }

    #[test]
    fn test_database_errors_do_not_leak_detail() {
        let err = AppError::Database(sqlx::Error::RowNotFound);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_is_unprocessable() {
        let err = AppError::Validation("email is invalid".to_string());
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), "email is invalid");
    }
}

//! API error types with JSON responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use bookswap_exchange::ExchangeError;

/// API error that can be returned from handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad request (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Unauthorized (401) — missing or invalid session token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal server error (500).
    #[error("internal error: {0}")]
    Internal(String),

    /// Lifecycle engine refusal or failure.
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
}

impl ApiError {
    /// Get the error code string for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Exchange(e) => match e {
                ExchangeError::NotFound(_) => "NOT_FOUND",
                ExchangeError::Forbidden(_) => "FORBIDDEN",
                ExchangeError::InvalidState(_) => "INVALID_STATE",
                ExchangeError::Conflict(_) => "CONFLICT",
                ExchangeError::BadRequest(_) => "BAD_REQUEST",
                ExchangeError::Storage(_) => "STORAGE_ERROR",
            },
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Exchange(e) => match e {
                ExchangeError::NotFound(_) => StatusCode::NOT_FOUND,
                ExchangeError::Forbidden(_) => StatusCode::FORBIDDEN,
                ExchangeError::InvalidState(_) | ExchangeError::Conflict(_) => StatusCode::CONFLICT,
                ExchangeError::BadRequest(_) => StatusCode::BAD_REQUEST,
                ExchangeError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error details.
    pub error: ErrorDetails,
}

/// Error details within the response.
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    /// Error code (e.g., "NOT_FOUND", "INVALID_STATE").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_http() {
        let cases = [
            (
                ApiError::Exchange(ExchangeError::NotFound("offer".into())),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                ApiError::Exchange(ExchangeError::Forbidden("nope".into())),
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
            ),
            (
                ApiError::Exchange(ExchangeError::InvalidState("already terminal".into())),
                StatusCode::CONFLICT,
                "INVALID_STATE",
            ),
            (
                ApiError::Exchange(ExchangeError::Conflict("listing held".into())),
                StatusCode::CONFLICT,
                "CONFLICT",
            ),
            (
                ApiError::Exchange(ExchangeError::BadRequest("rating".into())),
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
            ),
            (
                ApiError::Unauthorized("no token".into()),
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
            ),
        ];

        for (err, status, code) in cases {
            assert_eq!(err.status_code(), status);
            assert_eq!(err.code(), code);
        }
    }
}

//! API Error Handling
//!
//! Structured error responses with proper HTTP status codes and request tracking.

use crate::errors::CasinoError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::error;

/// Error envelope returned for every failed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    /// NOT_FOUND, UNAUTHORIZED, INSUFFICIENT_FUNDS, ...
    pub code: String,
    pub request_id: String,
}

/// API error types with request tracking
#[derive(Debug)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub request_id: String,
}

#[derive(Debug)]
pub enum ApiErrorKind {
    NotFound { code: &'static str, message: String },
    Unauthorized { code: &'static str, message: String },
    BadRequest { code: &'static str, message: String },
    InternalError { code: &'static str, message: String },
}

impl ApiError {
    pub fn not_found(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::NotFound { code: "NOT_FOUND", message },
            request_id,
        }
    }

    pub fn bad_request(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::BadRequest { code: "BAD_REQUEST", message },
            request_id,
        }
    }

    /// Map a core error onto its HTTP class
    pub fn from_casino(request_id: String, err: CasinoError) -> Self {
        let code = err.code();
        let message = err.to_string();
        let kind = match err {
            CasinoError::NotFound(_) => ApiErrorKind::NotFound { code, message },
            CasinoError::Unauthorized(_) => ApiErrorKind::Unauthorized { code, message },
            CasinoError::InsufficientFunds { .. }
            | CasinoError::InvalidChoice(_)
            | CasinoError::Validation(_) => ApiErrorKind::BadRequest { code, message },
            CasinoError::Storage(_) | CasinoError::Configuration(_) => {
                error!("[{}] {}", request_id, message);
                ApiErrorKind::InternalError { code, message }
            }
        };
        Self { kind, request_id }
    }

    pub fn status(&self) -> StatusCode {
        match &self.kind {
            ApiErrorKind::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiErrorKind::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiErrorKind::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiErrorKind::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn parts(&self) -> (&'static str, &str) {
        match &self.kind {
            ApiErrorKind::NotFound { code, message }
            | ApiErrorKind::Unauthorized { code, message }
            | ApiErrorKind::BadRequest { code, message }
            | ApiErrorKind::InternalError { code, message } => (*code, message.as_str()),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (code, message) = self.parts();
        write!(f, "[{}] {}: {}", self.request_id, code, message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = self.parts();

        let body = Json(ErrorResponse {
            success: false,
            message: message.to_string(),
            code: code.to_string(),
            request_id: self.request_id.clone(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StorageError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CasinoError::NotFound("1".into()), StatusCode::NOT_FOUND),
            (CasinoError::Unauthorized("1".into()), StatusCode::UNAUTHORIZED),
            (
                CasinoError::InsufficientFunds { requested: 5, available: 1 },
                StatusCode::BAD_REQUEST,
            ),
            (CasinoError::InvalidChoice("x".into()), StatusCode::BAD_REQUEST),
            (CasinoError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                CasinoError::Storage(StorageError::WriteFailed("disk".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from_casino("req".into(), err).status(), status);
        }
    }

    #[test]
    fn test_code_is_preserved() {
        let err = ApiError::from_casino(
            "req-1".into(),
            CasinoError::InsufficientFunds { requested: 5, available: 1 },
        );
        assert_eq!(err.parts().0, "INSUFFICIENT_FUNDS");
        assert!(err.to_string().starts_with("[req-1] INSUFFICIENT_FUNDS"));
    }
}

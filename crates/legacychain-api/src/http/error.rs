//! Application error type mapping to HTTP status codes and the error body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use legacychain_types::error::{CipherError, WillError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Error from a will lifecycle operation.
    Will(WillError),
    /// Malformed request (bad JSON, missing field, bad key encoding).
    Validation(String),
}

impl From<WillError> for AppError {
    fn from(e: WillError) -> Self {
        AppError::Will(e)
    }
}

impl From<CipherError> for AppError {
    fn from(e: CipherError) -> Self {
        AppError::Will(e.into())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Will(e) => match e {
                WillError::Validation(_) => StatusCode::BAD_REQUEST,
                WillError::NotFound(_) => StatusCode::NOT_FOUND,
                WillError::NotYetUnlockable { .. } => StatusCode::CONFLICT,
                WillError::DecryptionFailed => StatusCode::UNPROCESSABLE_ENTITY,
                WillError::Network(_) | WillError::StorageUnavailable(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                WillError::Config(_)
                | WillError::LedgerRejected(_)
                | WillError::AuditLog(_)
                | WillError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Will(e) => e.kind(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = match &self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Will(e) => e.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(code, status = status.as_u16(), "request failed: {message}");
        } else {
            tracing::debug!(code, status = status.as_u16(), "request rejected: {message}");
        }

        let mut error = json!({ "code": code, "message": message });
        if let AppError::Will(WillError::NotYetUnlockable { remaining }) = &self {
            error["remaining"] = json!(remaining);
        }

        (status, Json(json!({ "ok": false, "error": error }))).into_response()
    }
}

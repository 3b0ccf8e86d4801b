//! Success envelope for API responses.
//!
//! Every success body carries `"ok": true` next to the payload's own fields:
//! ```json
//! { "ok": true, "txId": "..." }
//! ```
//! Errors use `{ "ok": false, "error": { "code", "message" } }` (see
//! [`crate::http::error`]).

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Envelope wrapping a payload that serializes as a JSON object.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    ok: bool,
    #[serde(flatten)]
    data: T,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 OK.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data,
            status: StatusCode::OK,
        }
    }

    /// 201 Created.
    pub fn created(data: T) -> Self {
        Self {
            ok: true,
            data,
            status: StatusCode::CREATED,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

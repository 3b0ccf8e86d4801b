//! Audit history handlers.

use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use legacychain_types::history::HistoryEntry;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Query parameters for `GET /api/history`.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

#[derive(Debug, Serialize)]
pub struct HistoryBody {
    pub entries: Vec<HistoryEntry>,
}

/// GET /api/will/{owner}/history - One will's entries, oldest first.
pub async fn will_history(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<ApiResponse<HistoryBody>, AppError> {
    let entries = state.will_service.history(owner.trim()).await?;
    Ok(ApiResponse::ok(HistoryBody { entries }))
}

/// GET /api/history - Most recent entries across all wills, newest first.
pub async fn recent_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<ApiResponse<HistoryBody>, AppError> {
    let entries = state.will_service.recent_history(query.limit).await?;
    Ok(ApiResponse::ok(HistoryBody { entries }))
}

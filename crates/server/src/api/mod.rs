//! HTTP handlers, grouped by resource.
//!
//! Shared error shape and the `SyncError` -> status mapping live here.

mod health;
mod leads;
mod source;

pub use health::health;
pub use leads::leads_list;
pub use source::{assignment_rules, quick_import, source_leads, sync_start, sync_status};

use axum::http::StatusCode;
use axum::Json;
use leadsync_ingest::SyncError;
use serde::Serialize;

// ── Shared types ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

pub(crate) type ApiResult<T> = Result<T, (StatusCode, Json<ErrorResponse>)>;

pub(crate) fn error_response(
    status: StatusCode,
    msg: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: msg.into(),
        }),
    )
}

pub(crate) fn sync_error(e: SyncError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &e {
        SyncError::EmptySelection | SyncError::InvalidLead(_) => StatusCode::BAD_REQUEST,
        SyncError::AlreadyRunning => StatusCode::CONFLICT,
        SyncError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        SyncError::Upstream(_) => StatusCode::BAD_GATEWAY,
    };
    error_response(status, e.to_string())
}

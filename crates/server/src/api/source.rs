//! Call-center sync endpoints under `/api/source`.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use leadsync_core::{
    AssignmentRule, DiscoveryResponse, ImportAccepted, ImportRequest, QuickImportResponse,
    SyncJobSnapshot,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::state::AppState;

use super::{error_response, sync_error, ApiResult};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryQuery {
    #[serde(default)]
    pub counts_only: bool,
}

/// GET /api/source/leads -- sale leads plus per-list coverage.
pub async fn source_leads(
    State(state): State<Arc<AppState>>,
    Query(q): Query<DiscoveryQuery>,
) -> ApiResult<Json<DiscoveryResponse>> {
    let cc = state.call_center.as_ref().ok_or_else(|| {
        error_response(StatusCode::BAD_GATEWAY, "call-center API is not configured")
    })?;
    let resp = leadsync_ingest::discover(cc.as_ref(), q.counts_only)
        .await
        .map_err(|e| {
            warn!(error = %e, "discovery failed");
            error_response(
                StatusCode::BAD_GATEWAY,
                format!("Failed to fetch leads from {}: {}", state.config.source.name, e),
            )
        })?;
    Ok(Json(resp))
}

/// POST /api/source/sync -- start a background import; progress via sync-status.
pub async fn sync_start(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImportRequest>,
) -> ApiResult<(StatusCode, Json<ImportAccepted>)> {
    let accepted = state
        .executor
        .start_full_import(req.selected_leads)
        .map_err(sync_error)?;
    info!(job_id = %accepted.job_id, total = accepted.total_leads, "full import accepted");
    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

/// POST /api/source/quick-import -- import synchronously, no enrichment.
pub async fn quick_import(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImportRequest>,
) -> ApiResult<Json<QuickImportResponse>> {
    let resp = state
        .executor
        .quick_import(req.selected_leads)
        .await
        .map_err(sync_error)?;
    Ok(Json(resp))
}

/// GET /api/source/sync-status
pub async fn sync_status(State(state): State<Arc<AppState>>) -> Json<SyncJobSnapshot> {
    Json(state.controller().snapshot())
}

#[derive(Serialize)]
pub struct RulesResponse {
    pub rules: Vec<AssignmentRule>,
}

/// GET /api/source/assignment-rules -- the table used to tag leads by agent.
pub async fn assignment_rules(State(state): State<Arc<AppState>>) -> Json<RulesResponse> {
    Json(RulesResponse {
        rules: state.executor.rules().rules().to_vec(),
    })
}

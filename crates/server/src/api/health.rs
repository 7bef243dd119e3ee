use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use leadsync_core::SyncStatus;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub store: &'static str,
    pub source_configured: bool,
    pub sync: SyncStatus,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        store: state.store.backend_name(),
        source_configured: state.call_center.is_some(),
        sync: state.controller().snapshot().status,
    })
}

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use leadsync_storage::StoredLead;
use tracing::error;

use crate::state::AppState;

use super::{error_response, ApiResult};

/// GET /api/leads -- every stored lead, oldest first.
pub async fn leads_list(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<StoredLead>>> {
    let leads = state.store.list().await.map_err(|e| {
        error!(error = %e, "listing leads failed");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(Json(leads))
}

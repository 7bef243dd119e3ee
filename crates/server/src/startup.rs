//! Server startup: shared state initialization.

use std::sync::Arc;

use anyhow::Context;
use leadsync_core::{AssignmentTable, Config};
use leadsync_ingest::{CallCenter, HttpCallCenter};
use leadsync_storage::open_store;
use tracing::{info, warn};

use crate::state::AppState;

/// Open the store, load assignment rules and connect the call-center client.
pub async fn build_app_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = open_store(&config.store)
        .await
        .with_context(|| format!("opening {} lead store", config.store.backend.as_str()))?;

    let rules = AssignmentTable::load_or_builtin(config.sync.assignment_rules_path.as_deref())
        .context("loading assignment rules")?;
    info!(rules = rules.rules().len(), "assignment table ready");

    let call_center: Option<Arc<dyn CallCenter>> = if config.source.is_configured() {
        let client: Arc<dyn CallCenter> = Arc::new(
            HttpCallCenter::new(&config.source).context("building call-center client")?,
        );
        info!(source = %config.source.name, "call-center client ready");
        Some(client)
    } else {
        warn!("SOURCE_API_URL not set; lead discovery disabled, imports still accepted");
        None
    };

    Ok(Arc::new(AppState::new(config, store, call_center, rules)))
}

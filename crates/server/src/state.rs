use std::sync::Arc;

use leadsync_core::{AssignmentTable, Config};
use leadsync_ingest::{CallCenter, ExecutorOptions, ImportExecutor, SyncJobController};
use leadsync_storage::LeadStore;

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn LeadStore>,
    /// `None` when `SOURCE_API_URL` is unset; discovery then answers 502.
    pub call_center: Option<Arc<dyn CallCenter>>,
    pub executor: Arc<ImportExecutor>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn LeadStore>,
        call_center: Option<Arc<dyn CallCenter>>,
        rules: AssignmentTable,
    ) -> Self {
        let options = ExecutorOptions {
            source_name: config.source.name.clone(),
            fetch_enrichment: config.sync.fetch_enrichment,
            reset_after: config.sync.reset_after(),
        };
        let executor = Arc::new(ImportExecutor::new(
            store.clone(),
            call_center.clone(),
            Arc::new(SyncJobController::new()),
            Arc::new(rules),
            options,
        ));
        Self {
            config,
            store,
            call_center,
            executor,
        }
    }

    pub fn controller(&self) -> &SyncJobController {
        self.executor.controller()
    }
}

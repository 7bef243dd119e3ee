//! Import executor: dedup + merge + optional enrichment per selected lead.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use leadsync_core::{
    AssignmentTable, ImportAccepted, LeadError, QuickImportResponse, SourceLead,
};
use leadsync_storage::LeadStore;
use tracing::{debug, error, info, warn};

use crate::controller::{RunToken, SyncJobController};
use crate::error::SyncError;
use crate::merge::{merge_lead, MergeContext};
use crate::source::CallCenter;

#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    pub source_name: String,
    pub fetch_enrichment: bool,
    /// Delay before a finished job drops back to idle; `None` keeps it.
    pub reset_after: Option<Duration>,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            source_name: "ViciDial".to_string(),
            fetch_enrichment: true,
            reset_after: Some(Duration::from_secs(30)),
        }
    }
}

pub struct ImportExecutor {
    store: Arc<dyn LeadStore>,
    call_center: Option<Arc<dyn CallCenter>>,
    controller: Arc<SyncJobController>,
    rules: Arc<AssignmentTable>,
    options: ExecutorOptions,
}

impl ImportExecutor {
    pub fn new(
        store: Arc<dyn LeadStore>,
        call_center: Option<Arc<dyn CallCenter>>,
        controller: Arc<SyncJobController>,
        rules: Arc<AssignmentTable>,
        options: ExecutorOptions,
    ) -> Self {
        Self {
            store,
            call_center,
            controller,
            rules,
            options,
        }
    }

    pub fn controller(&self) -> &Arc<SyncJobController> {
        &self.controller
    }

    pub fn store(&self) -> &Arc<dyn LeadStore> {
        &self.store
    }

    pub fn rules(&self) -> &AssignmentTable {
        &self.rules
    }

    /// Merge one lead into the store.
    async fn import_one(&self, lead: &SourceLead, enrich: bool) -> Result<(), SyncError> {
        let identity = lead.identity()?;
        let mut lead = lead.clone();

        if enrich && self.options.fetch_enrichment && lead.enrichment.is_none() {
            if let Some(cc) = &self.call_center {
                match cc.interactions(identity).await {
                    Ok(history) => lead.enrichment = Some(history),
                    Err(e) => {
                        warn!(lead_id = %identity, error = %e, "enrichment fetch failed, importing without it")
                    }
                }
            }
        }

        let existing = self.store.find_by_identity(identity).await?;
        let created = existing.is_none();
        let ctx = MergeContext {
            source_name: &self.options.source_name,
            assignment: self.rules.resolve_lead(&lead),
            now: Utc::now(),
        };
        let record = merge_lead(existing, &lead, &ctx)?;
        debug!(
            lead_id = %identity,
            key = %record.id,
            created,
            assigned_to = ctx.assignment.map(|r| r.tag.as_str()).unwrap_or("-"),
            "lead merged"
        );
        self.store.upsert(record).await?;
        Ok(())
    }

    /// Import synchronously without enrichment. Per-lead failures are
    /// reported in the response; a systemic store failure fails the call.
    pub async fn quick_import(
        &self,
        leads: Vec<SourceLead>,
    ) -> Result<QuickImportResponse, SyncError> {
        if leads.is_empty() {
            return Err(SyncError::EmptySelection);
        }
        let total = leads.len();
        let mut imported = 0;
        let mut errors = Vec::new();

        for lead in &leads {
            match self.import_one(lead, false).await {
                Ok(()) => imported += 1,
                Err(e) if e.is_systemic() => {
                    error!(error = %e, imported, "quick import aborted");
                    return Err(e);
                }
                Err(e) => {
                    warn!(lead_id = %lead.id, error = %e, "lead skipped");
                    errors.push(LeadError {
                        lead_id: lead.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let message = format!("Imported {} of {} leads", imported, total);
        info!(total, imported, failed = errors.len(), "quick import finished");
        if let Some(token) =
            self.controller
                .record_quick_import(total, imported, errors.clone(), message.clone())
        {
            self.schedule_reset(token);
        }
        Ok(QuickImportResponse {
            success: true,
            imported,
            message,
            errors,
        })
    }

    /// Claim the job and run the import in the background.
    pub fn start_full_import(
        self: &Arc<Self>,
        leads: Vec<SourceLead>,
    ) -> Result<ImportAccepted, SyncError> {
        if leads.is_empty() {
            return Err(SyncError::EmptySelection);
        }
        let total = leads.len();
        let token = self.controller.try_start(total)?;
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.run_full(token, leads).await;
        });
        Ok(ImportAccepted {
            accepted: true,
            job_id: token.job_id(),
            total_leads: total,
            message: format!("Import of {} leads started", total),
        })
    }

    /// Process a batch for an already-started run, then finish the job.
    pub async fn run_full(&self, token: RunToken, leads: Vec<SourceLead>) {
        let total = leads.len();
        let mut imported = 0;
        let mut failed = 0;

        for (idx, lead) in leads.iter().enumerate() {
            match self.import_one(lead, true).await {
                Ok(()) => imported += 1,
                Err(e) if e.is_systemic() => {
                    error!(job_id = %token.job_id(), error = %e, imported, "import aborted");
                    self.controller.fail(
                        &token,
                        format!("Import aborted after {} of {} leads: {}", idx, total, e),
                    );
                    self.schedule_reset(token);
                    return;
                }
                Err(e) => {
                    failed += 1;
                    warn!(job_id = %token.job_id(), lead_id = %lead.id, error = %e, "lead failed");
                    self.controller.record_lead_error(
                        &token,
                        LeadError {
                            lead_id: lead.id.clone(),
                            error: e.to_string(),
                        },
                    );
                }
            }
            let processed = idx + 1;
            self.controller.record_progress(
                &token,
                processed,
                imported,
                format!("Processed {} of {} leads", processed, total),
            );
        }

        if imported == 0 && failed > 0 {
            self.controller.fail(&token, "Failed to import leads");
        } else {
            self.controller.complete(
                &token,
                format!("Successfully imported {} of {} leads", imported, total),
            );
        }
        info!(job_id = %token.job_id(), total, imported, failed, "sync job finished");
        self.schedule_reset(token);
    }

    fn schedule_reset(&self, token: RunToken) {
        let Some(delay) = self.options.reset_after else {
            return;
        };
        let controller = Arc::clone(&self.controller);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if controller.reset_to_idle(&token) {
                debug!(job_id = %token.job_id(), "sync job reset to idle");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use leadsync_core::SyncStatus;
    use leadsync_storage::{MemoryLeadStore, StoreError, StoredLead};
    use serde_json::json;

    use super::*;
    use crate::mock::{lead, FakeCallCenter};

    fn executor_with(
        store: Arc<dyn LeadStore>,
        cc: Option<Arc<dyn CallCenter>>,
    ) -> Arc<ImportExecutor> {
        Arc::new(ImportExecutor::new(
            store,
            cc,
            Arc::new(SyncJobController::new()),
            Arc::new(AssignmentTable::builtin()),
            ExecutorOptions {
                reset_after: None,
                ..Default::default()
            },
        ))
    }

    fn listed(id: &str, list_id: &str, list_name: &str) -> SourceLead {
        let mut l = lead(id, &format!("Company {}", id));
        l.list_id = Some(list_id.into());
        l.list_name = Some(list_name.into());
        l
    }

    /// Store that goes away after a fixed number of writes.
    struct FlakyStore {
        inner: MemoryLeadStore,
        writes_left: AtomicUsize,
    }

    #[async_trait]
    impl LeadStore for FlakyStore {
        async fn get(&self, id: &str) -> Result<Option<StoredLead>, StoreError> {
            self.inner.get(id).await
        }
        async fn find_by_identity(&self, identity: &str) -> Result<Option<StoredLead>, StoreError> {
            self.inner.find_by_identity(identity).await
        }
        async fn upsert(&self, lead: StoredLead) -> Result<(), StoreError> {
            let left = self.writes_left.load(Ordering::SeqCst);
            if left == 0 {
                return Err(StoreError::Unavailable("connection refused".into()));
            }
            self.writes_left.store(left - 1, Ordering::SeqCst);
            self.inner.upsert(lead).await
        }
        async fn list(&self) -> Result<Vec<StoredLead>, StoreError> {
            self.inner.list().await
        }
        fn backend_name(&self) -> &'static str {
            "flaky"
        }
    }

    /// Store that samples the job percentage on every write.
    struct ProgressProbe {
        inner: MemoryLeadStore,
        controller: Arc<SyncJobController>,
        seen: Mutex<Vec<u8>>,
    }

    #[async_trait]
    impl LeadStore for ProgressProbe {
        async fn get(&self, id: &str) -> Result<Option<StoredLead>, StoreError> {
            self.inner.get(id).await
        }
        async fn find_by_identity(&self, identity: &str) -> Result<Option<StoredLead>, StoreError> {
            self.inner.find_by_identity(identity).await
        }
        async fn upsert(&self, lead: StoredLead) -> Result<(), StoreError> {
            self.seen.lock().unwrap().push(self.controller.snapshot().percentage);
            self.inner.upsert(lead).await
        }
        async fn list(&self) -> Result<Vec<StoredLead>, StoreError> {
            self.inner.list().await
        }
        fn backend_name(&self) -> &'static str {
            "probe"
        }
    }

    #[tokio::test]
    async fn quick_import_is_synchronous() {
        let store = Arc::new(MemoryLeadStore::new());
        let exec = executor_with(store.clone(), None);
        let leads = vec![lead("1", "A"), lead("2", "B"), lead("3", "C")];

        let resp = exec.quick_import(leads).await.unwrap();
        assert!(resp.success);
        assert_eq!(resp.imported, 3);
        assert_eq!(store.len().await, 3);
        assert_eq!(exec.controller().snapshot().status, SyncStatus::Completed);
    }

    #[tokio::test]
    async fn quick_import_is_idempotent() {
        let store = Arc::new(MemoryLeadStore::new());
        let exec = executor_with(store.clone(), None);
        let leads = vec![listed("1", "998", "Hunter List A"), listed("2", "42", "Other")];

        exec.quick_import(leads.clone()).await.unwrap();
        exec.quick_import(leads).await.unwrap();
        assert_eq!(store.len().await, 2);
        let rec = store.find_by_identity("1").await.unwrap().unwrap();
        assert_eq!(rec.data["tags"], json!(["ViciDial", "Sale", "List-998"]));
        assert_eq!(rec.get_str("assignedTo"), Some("HUNTER"));
    }

    #[tokio::test]
    async fn empty_selection_is_rejected() {
        let exec = executor_with(Arc::new(MemoryLeadStore::new()), None);
        assert!(matches!(
            exec.quick_import(Vec::new()).await,
            Err(SyncError::EmptySelection)
        ));
        assert!(matches!(
            exec.start_full_import(Vec::new()),
            Err(SyncError::EmptySelection)
        ));
        assert_eq!(exec.controller().snapshot().status, SyncStatus::Idle);
    }

    #[tokio::test]
    async fn notes_survive_reimport() {
        let store = Arc::new(MemoryLeadStore::new());
        let exec = executor_with(store.clone(), None);
        exec.quick_import(vec![lead("7", "ACME")]).await.unwrap();

        let mut rec = store.find_by_identity("7").await.unwrap().unwrap();
        rec.data.insert("notes".into(), json!("VIP"));
        store.upsert(rec).await.unwrap();

        exec.quick_import(vec![lead("7", "ACME")]).await.unwrap();
        let rec = store.find_by_identity("7").await.unwrap().unwrap();
        assert_eq!(rec.get_str("notes"), Some("VIP"));
    }

    #[tokio::test]
    async fn full_import_enriches_and_completes() {
        let store = Arc::new(MemoryLeadStore::new());
        let cc = Arc::new(FakeCallCenter {
            broken_interactions: vec!["2".into()],
            ..Default::default()
        });
        let exec = executor_with(store.clone(), Some(cc.clone()));
        let leads = vec![lead("1", "A"), lead("2", "B")];

        let token = exec.controller().try_start(leads.len()).unwrap();
        exec.run_full(token, leads).await;

        let snap = exec.controller().snapshot();
        assert_eq!(snap.status, SyncStatus::Completed);
        assert_eq!(snap.percentage, 100);
        assert_eq!(snap.processed_leads, 2);
        assert_eq!(snap.imported_leads, 2);
        assert!(snap.errors.is_empty());

        let one = store.find_by_identity("1").await.unwrap().unwrap();
        assert!(one.data.contains_key("enrichment"));
        let two = store.find_by_identity("2").await.unwrap().unwrap();
        assert!(!two.data.contains_key("enrichment"));
        assert_eq!(cc.interaction_calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn repeated_full_import_updates_in_place() {
        let store = Arc::new(MemoryLeadStore::new());
        let exec = executor_with(store.clone(), None);

        let mut first = lead("1", "ACME");
        first.phone = Some("330-555-0199".into());
        let token = exec.controller().try_start(1).unwrap();
        exec.run_full(token, vec![first]).await;
        let created_at = store
            .find_by_identity("1")
            .await
            .unwrap()
            .unwrap()
            .get_str("createdAt")
            .map(str::to_string);
        exec.controller().reset_to_idle(&token);

        let mut second = lead("1", "ACME");
        second.phone = Some("216-555-0100".into());
        let token = exec.controller().try_start(1).unwrap();
        exec.run_full(token, vec![second]).await;

        assert_eq!(exec.controller().snapshot().status, SyncStatus::Completed);
        assert_eq!(store.len().await, 1);
        let rec = store.find_by_identity("1").await.unwrap().unwrap();
        assert_eq!(rec.get_str("phone"), Some("(216) 555-0100"));
        assert_eq!(rec.get_str("createdAt").map(str::to_string), created_at);
        assert!(created_at.is_some());
    }

    #[tokio::test]
    async fn full_import_progress_is_monotonic() {
        let controller = Arc::new(SyncJobController::new());
        let probe = Arc::new(ProgressProbe {
            inner: MemoryLeadStore::new(),
            controller: controller.clone(),
            seen: Mutex::new(Vec::new()),
        });
        let exec = ImportExecutor::new(
            probe.clone(),
            None,
            controller.clone(),
            Arc::new(AssignmentTable::builtin()),
            ExecutorOptions {
                reset_after: None,
                ..Default::default()
            },
        );
        let leads: Vec<_> = (1..=8).map(|i| lead(&i.to_string(), "X")).collect();

        let token = controller.try_start(leads.len()).unwrap();
        exec.run_full(token, leads).await;

        let seen = probe.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 8);
        assert_eq!(seen[0], 0);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{:?}", seen);
        assert!(seen[1..].iter().all(|p| (25..=95).contains(p)));
        assert_eq!(controller.snapshot().percentage, 100);
    }

    #[tokio::test]
    async fn invalid_leads_are_recorded_and_batch_continues() {
        let store = Arc::new(MemoryLeadStore::new());
        let exec = executor_with(store.clone(), None);
        let leads = vec![lead("1", "A"), SourceLead::new(""), lead("3", "C")];

        let token = exec.controller().try_start(leads.len()).unwrap();
        exec.run_full(token, leads).await;

        let snap = exec.controller().snapshot();
        assert_eq!(snap.status, SyncStatus::Completed);
        assert_eq!(snap.errors.len(), 1);
        assert_eq!(snap.imported_leads, 2);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn all_failed_batch_ends_in_error() {
        let exec = executor_with(Arc::new(MemoryLeadStore::new()), None);
        let token = exec.controller().try_start(2).unwrap();
        exec.run_full(token, vec![SourceLead::new(""), SourceLead::new(" ")])
            .await;
        let snap = exec.controller().snapshot();
        assert_eq!(snap.status, SyncStatus::Error);
        assert_eq!(snap.message, "Failed to import leads");
        assert_eq!(snap.errors.len(), 2);
    }

    #[tokio::test]
    async fn systemic_failure_aborts_and_keeps_earlier_leads() {
        let store = Arc::new(FlakyStore {
            inner: MemoryLeadStore::new(),
            writes_left: AtomicUsize::new(2),
        });
        let exec = executor_with(store.clone(), None);
        let leads: Vec<_> = (1..=5).map(|i| lead(&i.to_string(), "X")).collect();

        let token = exec.controller().try_start(leads.len()).unwrap();
        exec.run_full(token, leads).await;

        let snap = exec.controller().snapshot();
        assert_eq!(snap.status, SyncStatus::Error);
        assert_eq!(snap.processed_leads, 2);
        assert!(snap.message.contains("connection refused"));
        assert_eq!(store.inner.len().await, 2);
    }

    #[tokio::test]
    async fn systemic_failure_fails_quick_import() {
        let store = Arc::new(FlakyStore {
            inner: MemoryLeadStore::new(),
            writes_left: AtomicUsize::new(0),
        });
        let exec = executor_with(store, None);
        let err = exec.quick_import(vec![lead("1", "A")]).await.unwrap_err();
        assert!(matches!(err, SyncError::Store(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn concurrent_start_is_rejected() {
        let exec = executor_with(Arc::new(MemoryLeadStore::new()), None);
        let _token = exec.controller().try_start(1).unwrap();
        assert!(matches!(
            exec.start_full_import(vec![lead("1", "A")]),
            Err(SyncError::AlreadyRunning)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn finished_job_resets_to_idle() {
        let exec = Arc::new(ImportExecutor::new(
            Arc::new(MemoryLeadStore::new()),
            None,
            Arc::new(SyncJobController::new()),
            Arc::new(AssignmentTable::builtin()),
            ExecutorOptions {
                reset_after: Some(Duration::from_secs(30)),
                ..Default::default()
            },
        ));
        let accepted = exec.start_full_import(vec![lead("1", "A")]).unwrap();
        assert!(accepted.accepted);

        tokio::time::sleep(Duration::from_secs(1)).await;
        let snap = exec.controller().snapshot();
        assert_eq!(snap.status, SyncStatus::Completed);
        assert_eq!(snap.job_id, Some(accepted.job_id));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(exec.controller().snapshot().status, SyncStatus::Idle);
    }
}

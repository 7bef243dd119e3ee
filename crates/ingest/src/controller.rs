//! Process-wide sync job state machine.
//!
//! `idle -> running -> completed | error`, with a new run allowed from any
//! non-running state. Every mutation happens under one mutex so readers
//! always see a consistent `(status, percentage, processed, total)`.

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use leadsync_core::{LeadError, SyncJobSnapshot, SyncStatus};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::SyncError;

/// Handle for one run. Updates made with a stale handle are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunToken {
    generation: u64,
    job_id: Uuid,
}

impl RunToken {
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }
}

struct JobState {
    generation: u64,
    snapshot: SyncJobSnapshot,
}

/// Progress shown while running: never below 25 or above 95 so the bar
/// visibly moves without claiming to be done.
pub fn running_percentage(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 25;
    }
    let raw = processed.saturating_mul(100) / total;
    raw.clamp(25, 95) as u8
}

pub struct SyncJobController {
    state: Mutex<JobState>,
}

impl Default for SyncJobController {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncJobController {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(JobState {
                generation: 0,
                snapshot: SyncJobSnapshot::idle(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, JobState> {
        // The state is plain data; a panicked writer cannot leave it torn.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> SyncJobSnapshot {
        self.lock().snapshot.clone()
    }

    pub fn is_running(&self) -> bool {
        self.lock().snapshot.status == SyncStatus::Running
    }

    /// Check-and-set into `running`. Fails when a run is already in flight.
    pub fn try_start(&self, total: usize) -> Result<RunToken, SyncError> {
        let mut state = self.lock();
        if state.snapshot.status == SyncStatus::Running {
            return Err(SyncError::AlreadyRunning);
        }
        state.generation += 1;
        let token = RunToken {
            generation: state.generation,
            job_id: Uuid::new_v4(),
        };
        state.snapshot = SyncJobSnapshot {
            job_id: Some(token.job_id),
            status: SyncStatus::Running,
            percentage: 0,
            message: format!("Starting import of {} leads", total),
            total_leads: total,
            processed_leads: 0,
            imported_leads: 0,
            start_time: Some(Utc::now()),
            errors: Vec::new(),
        };
        info!(job_id = %token.job_id, total, "sync job started");
        Ok(token)
    }

    fn with_current<F>(&self, token: &RunToken, f: F) -> bool
    where
        F: FnOnce(&mut SyncJobSnapshot),
    {
        let mut state = self.lock();
        if state.generation != token.generation {
            debug!(job_id = %token.job_id, "ignoring update from superseded run");
            return false;
        }
        f(&mut state.snapshot);
        true
    }

    /// Advance counters after one lead. Percentage only moves forward.
    pub fn record_progress(
        &self,
        token: &RunToken,
        processed: usize,
        imported: usize,
        message: impl Into<String>,
    ) -> bool {
        let message = message.into();
        self.with_current(token, |snap| {
            if snap.status != SyncStatus::Running {
                return;
            }
            let pct = running_percentage(processed, snap.total_leads);
            snap.percentage = snap.percentage.max(pct);
            snap.processed_leads = processed;
            snap.imported_leads = imported;
            snap.message = message;
        })
    }

    pub fn record_lead_error(&self, token: &RunToken, error: LeadError) -> bool {
        self.with_current(token, |snap| snap.errors.push(error))
    }

    pub fn complete(&self, token: &RunToken, message: impl Into<String>) -> bool {
        let message = message.into();
        self.with_current(token, |snap| {
            snap.status = SyncStatus::Completed;
            snap.percentage = 100;
            snap.message = message;
        })
    }

    pub fn fail(&self, token: &RunToken, message: impl Into<String>) -> bool {
        let message = message.into();
        self.with_current(token, |snap| {
            snap.status = SyncStatus::Error;
            snap.message = message;
        })
    }

    /// Record a finished quick import. A full run in flight keeps ownership
    /// of the job, in which case nothing is recorded and `None` is returned.
    pub fn record_quick_import(
        &self,
        total: usize,
        imported: usize,
        errors: Vec<LeadError>,
        message: impl Into<String>,
    ) -> Option<RunToken> {
        let mut state = self.lock();
        if state.snapshot.status == SyncStatus::Running {
            return None;
        }
        state.generation += 1;
        let token = RunToken {
            generation: state.generation,
            job_id: Uuid::new_v4(),
        };
        state.snapshot = SyncJobSnapshot {
            job_id: Some(token.job_id),
            status: SyncStatus::Completed,
            percentage: 100,
            message: message.into(),
            total_leads: total,
            processed_leads: total,
            imported_leads: imported,
            start_time: Some(Utc::now()),
            errors,
        };
        Some(token)
    }

    /// Return to `idle` unless another run has started since `token`.
    pub fn reset_to_idle(&self, token: &RunToken) -> bool {
        self.with_current(token, |snap| {
            if snap.status.is_terminal() {
                *snap = SyncJobSnapshot::idle();
            }
        })
    }
}

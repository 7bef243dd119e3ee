//! Wire form of the sync job status resource.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Idle,
    Running,
    Completed,
    Error,
    /// Anything a newer server reports that this build does not know about.
    #[serde(other)]
    Unknown,
}

impl SyncStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lead that failed inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadError {
    pub lead_id: String,
    pub error: String,
}

/// Consistent point-in-time view of the sync job, as served by
/// `GET /api/source/sync-status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncJobSnapshot {
    #[serde(default)]
    pub job_id: Option<Uuid>,
    pub status: SyncStatus,
    #[serde(default)]
    pub percentage: u8,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub total_leads: usize,
    #[serde(default)]
    pub processed_leads: usize,
    #[serde(default)]
    pub imported_leads: usize,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub errors: Vec<LeadError>,
}

impl SyncJobSnapshot {
    pub fn idle() -> Self {
        Self {
            job_id: None,
            status: SyncStatus::Idle,
            percentage: 0,
            message: "Ready".to_string(),
            total_leads: 0,
            processed_leads: 0,
            imported_leads: 0,
            start_time: None,
            errors: Vec::new(),
        }
    }
}

use leadsync_core::CoreError;
use leadsync_storage::StoreError;
use thiserror::Error;

/// Failures talking to the call-center API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("call-center API is not configured (SOURCE_API_URL)")]
    NotConfigured,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("call-center returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unreadable call-center payload: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("No leads selected for import")]
    EmptySelection,

    #[error("A sync job is already running")]
    AlreadyRunning,

    #[error(transparent)]
    InvalidLead(#[from] CoreError),

    #[error("lead store error: {0}")]
    Store(#[from] StoreError),

    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),
}

impl SyncError {
    /// Whether this error should stop a whole batch rather than one lead.
    pub fn is_systemic(&self) -> bool {
        match self {
            Self::Store(e) => e.is_systemic(),
            Self::InvalidLead(_) => false,
            _ => true,
        }
    }
}

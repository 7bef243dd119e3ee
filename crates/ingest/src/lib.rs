//! Call-center ingestion: discovery, the sync job state machine and the
//! import executor that merges leads into the CRM store.

pub mod controller;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod merge;
pub mod source;

#[cfg(test)]
mod mock;

pub use controller::{running_percentage, RunToken, SyncJobController};
pub use discovery::discover;
pub use error::{SyncError, UpstreamError};
pub use executor::{ExecutorOptions, ImportExecutor};
pub use source::{CallCenter, HttpCallCenter, SourceList};

//! Client library for the lead sync API: endpoint fallback, typed calls and
//! status polling.

pub mod client;
pub mod error;
pub mod poller;
pub mod resolver;

pub use client::{SourceAdapter, StatusSource};
pub use error::ClientError;
pub use poller::{PollPolicy, Progress, StatusPoller};
pub use resolver::{candidate_bases, EndpointResolver};

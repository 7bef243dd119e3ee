//! HTTP surface of the lead sync pipeline.

pub mod api;
pub mod router;
pub mod startup;
pub mod state;

pub use router::build_router;
pub use startup::build_app_state;
pub use state::AppState;

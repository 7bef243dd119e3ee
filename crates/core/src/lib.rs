pub mod assignment;
pub mod config;
pub mod error;
pub mod job;
pub mod lead;
pub mod normalize;

pub use assignment::{AssignmentRule, AssignmentTable};
pub use config::Config;
pub use error::*;
pub use job::*;
pub use lead::*;

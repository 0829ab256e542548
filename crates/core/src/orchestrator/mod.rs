//! Session orchestrator for the separation lifecycle.
//!
//! One call to [`SessionOrchestrator::process`] takes a session from quota
//! admission through worker submission, status polling and stem retrieval to
//! a durable on-disk record. The orchestrator is also the single gate for
//! everything that touches an existing session: previews, downloads and
//! deletion all pass through its ownership check.

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::SessionOrchestrator;
pub use types::{OrchestratorError, SubmissionResult};

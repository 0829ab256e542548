//! Retention enforcement for expired sessions.
//!
//! Sessions are transient: once older than the configured retention window,
//! everything they left behind is removed. [`ExpirySweeper::sweep`] does one
//! pass over remote objects, local directories and registry rows;
//! [`SweeperRunner`] repeats it on an interval.

mod config;
mod runner;
mod sweep;
mod types;

pub use config::SweeperConfig;
pub use runner::SweeperRunner;
pub use sweep::ExpirySweeper;
pub use types::SweepReport;

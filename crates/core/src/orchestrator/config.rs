//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the session orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// How often to poll the worker for job status (seconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Total time budget for a separation job (seconds).
    /// When exceeded, the session is marked timed out and polling stops.
    #[serde(default = "default_separation_timeout")]
    pub separation_timeout_secs: u64,
}

fn default_poll_interval() -> u64 {
    5
}

fn default_separation_timeout() -> u64 {
    300 // 5 minutes
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            separation_timeout_secs: default_separation_timeout(),
        }
    }
}

impl OrchestratorConfig {
    /// Override the poll interval (useful for tests).
    pub fn with_poll_interval(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    /// Override the separation time budget.
    pub fn with_separation_timeout(mut self, secs: u64) -> Self {
        self.separation_timeout_secs = secs;
        self
    }
}

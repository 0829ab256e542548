//! Types for remote separation worker operations.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while talking to the separation worker.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Download failed for stem {stem}: {reason}")]
    DownloadFailed { stem: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Status of a separation job as reported by the worker.
///
/// Anything the worker reports that doesn't map to a known state lands in
/// `Unknown`; callers treat it as still-running rather than an error.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    /// Waiting for a worker slot.
    Queued,
    /// Separation in progress.
    Running,
    /// Separation finished; output locators are ready to fetch.
    Completed(SeparationOutput),
    /// Worker reported a failure.
    Failed(String),
    /// Unrecognized status string, kept verbatim for logging.
    Unknown(String),
}

impl JobStatus {
    /// True for states the poll loop stops on.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed(_) | JobStatus::Failed(_))
    }
}

/// Per-stem fetch locators produced by a completed job.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeparationOutput {
    /// Stem name to transient download locator.
    pub stems: HashMap<String, String>,
}

/// Request to submit audio for separation.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    /// Session the job belongs to, passed through for worker-side tracing.
    pub session_id: String,
    /// Raw waveform payload.
    pub audio: Vec<u8>,
    /// Stem names to produce; must be non-empty.
    pub requested_stems: Vec<String>,
}

/// Trait for separation worker backends.
#[async_trait]
pub trait SeparationWorker: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Submit a separation job. Returns the worker's opaque job id.
    async fn submit(&self, request: SubmitRequest) -> Result<String, WorkerError>;

    /// Ask the worker for the current status of a job.
    async fn status(&self, job_id: &str) -> Result<JobStatus, WorkerError>;

    /// Download one stem from its transient locator into `dest`.
    async fn fetch_stem(&self, stem: &str, locator: &str, dest: &Path)
        -> Result<(), WorkerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_is_terminal() {
        assert!(JobStatus::Completed(SeparationOutput::default()).is_terminal());
        assert!(JobStatus::Failed("boom".to_string()).is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(!JobStatus::Unknown("PAUSED".to_string()).is_terminal());
    }

    #[test]
    fn test_worker_error_display() {
        let err = WorkerError::DownloadFailed {
            stem: "vocals".to_string(),
            reason: "HTTP 503".to_string(),
        };
        assert_eq!(err.to_string(), "Download failed for stem vocals: HTTP 503");

        assert_eq!(WorkerError::Timeout.to_string(), "Request timeout");
        assert_eq!(
            WorkerError::JobNotFound("job-1".to_string()).to_string(),
            "Job not found: job-1"
        );
    }

    #[test]
    fn test_separation_output_default_is_empty() {
        let output = SeparationOutput::default();
        assert!(output.stems.is_empty());
    }
}

//! Types for the session orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during session orchestration.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The user's monthly quota is exhausted.
    #[error("monthly quota exhausted: {used}/{limit}")]
    AdmissionDenied {
        used: u32,
        limit: u32,
        is_premium: bool,
    },

    /// The request itself is malformed (empty audio, unknown stems).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The job could not be handed to the separation worker.
    #[error("submission failed: {0}")]
    SubmissionFailed(String),

    /// The worker reported failure, or produced no usable stems.
    #[error("separation failed: {0}")]
    SeparationFailed(String),

    /// The separation did not finish within the time budget.
    #[error("separation timed out after {budget_secs}s")]
    SeparationTimedOut { budget_secs: u64 },

    /// The session does not exist or does not belong to the caller.
    /// Both cases produce this same error so callers cannot probe
    /// for sessions owned by other users.
    #[error("session not found")]
    AccessDenied,

    /// The stem is not among the session's available stems.
    #[error("stem not available: {stem}")]
    StemNotFound { stem: String },

    /// Quota ledger error.
    #[error("quota ledger error: {0}")]
    Quota(#[from] crate::quota::QuotaError),

    /// Session store error.
    #[error("session store error: {0}")]
    Store(#[from] crate::session::SessionStoreError),

    /// Packaging error.
    #[error("packaging error: {0}")]
    Packaging(#[from] crate::packaging::PackagingError),
}

/// Outcome of a successful separation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResult {
    /// Identifier of the new session.
    pub session_id: String,
    /// Stems that were actually produced and downloaded, sorted.
    pub available_stems: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OrchestratorError::AdmissionDenied {
            used: 10,
            limit: 10,
            is_premium: false,
        };
        assert_eq!(err.to_string(), "monthly quota exhausted: 10/10");

        let err = OrchestratorError::SeparationTimedOut { budget_secs: 300 };
        assert_eq!(err.to_string(), "separation timed out after 300s");

        let err = OrchestratorError::AccessDenied;
        assert_eq!(err.to_string(), "session not found");
    }

    #[test]
    fn test_submission_result_serialization() {
        let result = SubmissionResult {
            session_id: "abc-123".to_string(),
            available_stems: vec!["drums".to_string(), "vocals".to_string()],
        };

        let json = serde_json::to_string(&result).unwrap();
        let parsed: SubmissionResult = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.session_id, "abc-123");
        assert_eq!(parsed.available_stems, vec!["drums", "vocals"]);
    }
}

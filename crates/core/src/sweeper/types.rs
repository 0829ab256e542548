//! Types for the expiry sweeper.

use serde::{Deserialize, Serialize};

/// What one sweep run did.
///
/// A sweep never fails as a whole; anything that went wrong along the way is
/// collected in `errors` and retried by the next run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepReport {
    /// Sessions looked at (expired local dirs plus registry orphans).
    pub examined: usize,
    /// Sessions fully reclaimed.
    pub swept: usize,
    /// Remote objects removed.
    pub deleted_objects: usize,
    /// Registry rows removed.
    pub deleted_registry_rows: usize,
    /// Stale upload directories removed.
    pub deleted_upload_dirs: usize,
    /// Failures encountered, one message each.
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_report_default() {
        let report = SweepReport::default();
        assert_eq!(report.examined, 0);
        assert_eq!(report.swept, 0);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_sweep_report_serialization() {
        let report = SweepReport {
            examined: 3,
            swept: 2,
            deleted_objects: 4,
            deleted_registry_rows: 2,
            deleted_upload_dirs: 1,
            errors: vec!["one failure".to_string()],
        };

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"swept\":2"));
        assert!(json.contains("one failure"));
    }
}

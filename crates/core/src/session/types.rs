//! Session record types.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stem names the separation worker can produce.
pub const STEM_VOCABULARY: &[&str] = &["vocals", "drums", "bass", "guitar", "piano", "other"];

/// Check whether a stem name is part of the supported vocabulary.
pub fn is_known_stem(name: &str) -> bool {
    STEM_VOCABULARY.contains(&name)
}

/// Durable record of one completed separation session.
///
/// Written exactly once, when separation produces at least one stem, as a
/// sidecar file inside the session's output directory. The `user_id` here is
/// the sole authority for access control; `available_stems` never changes
/// after the record is written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    /// Unique session identifier, generated at submission time.
    pub session_id: String,
    /// Owning user.
    pub user_id: String,
    /// When the session was created (UTC).
    pub created_at: DateTime<Utc>,
    /// Stems that were actually downloaded, sorted by name.
    pub available_stems: Vec<String>,
    /// Local directory holding the stem files and this record.
    pub output_path: PathBuf,
    /// Prefix of the session's objects in remote storage, if any were uploaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_prefix: Option<String>,
}

/// Outcome of removing session artifacts.
///
/// Cleanup never fails the operation that triggered it; this type reports
/// what actually happened so callers can log it uniformly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CleanupOutcome {
    /// Everything that existed was removed.
    Cleaned,
    /// Some artifacts could not be removed.
    PartiallyCleaned { errors: Vec<String> },
    /// Nothing to remove.
    NotFound,
}

impl CleanupOutcome {
    /// True when nothing is left behind.
    pub fn is_clean(&self) -> bool {
        matches!(self, CleanupOutcome::Cleaned | CleanupOutcome::NotFound)
    }
}

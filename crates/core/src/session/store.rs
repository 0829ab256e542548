//! Session storage trait.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use super::{CleanupOutcome, SessionRecord};

/// Error type for session store operations.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// The record sidecar exists but cannot be parsed.
    #[error("Session record corrupt: {0}")]
    Corrupt(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Trait for session storage backends.
///
/// A session owns two directories: an output directory (stem files plus the
/// record sidecar, lives until deletion or sweep) and an upload directory
/// (the submitted payload, deleted as soon as the worker has it).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Path of the session's output directory.
    fn output_dir(&self, session_id: &str) -> PathBuf;

    /// Path of the session's transient upload directory.
    fn upload_dir(&self, session_id: &str) -> PathBuf;

    /// Path a stem file lives at inside the session's output directory.
    fn stem_path(&self, session_id: &str, stem: &str) -> PathBuf;

    /// Create the output and upload directories for a new session.
    async fn create_dirs(&self, session_id: &str) -> Result<(), SessionStoreError>;

    /// Write the submitted payload into the upload directory.
    async fn write_upload(
        &self,
        session_id: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, SessionStoreError>;

    /// Persist the session record sidecar.
    async fn write_record(&self, record: &SessionRecord) -> Result<(), SessionStoreError>;

    /// Load a session record. `Ok(None)` when the session or its sidecar is
    /// missing; `Err(Corrupt)` when the sidecar exists but cannot be parsed.
    async fn load_record(
        &self,
        session_id: &str,
    ) -> Result<Option<SessionRecord>, SessionStoreError>;

    /// Remove the session's output directory and everything in it.
    async fn delete_session_dir(&self, session_id: &str) -> CleanupOutcome;

    /// Remove the session's upload directory and everything in it.
    async fn delete_upload_dir(&self, session_id: &str) -> CleanupOutcome;

    /// Ids of all session output directories on disk, sorted.
    async fn list_session_dirs(&self) -> Result<Vec<String>, SessionStoreError>;

    /// Ids of all upload directories on disk, sorted.
    async fn list_upload_dirs(&self) -> Result<Vec<String>, SessionStoreError>;
}

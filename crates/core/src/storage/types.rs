//! Types for remote object storage operations.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while talking to remote object storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,
}

/// Trait for remote object storage backends.
///
/// Paths are bucket-relative, e.g. `<session_id>/vocals.wav`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// List object paths under a prefix.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Remove objects by path. Removing an already-absent path is not an error.
    async fn remove(&self, paths: &[String]) -> Result<(), StorageError>;
}

//! Durable session registry trait and types.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Error type for registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Database error.
    #[error("Registry database error: {0}")]
    Database(String),
}

/// One row in the durable session registry.
///
/// The registry is best-effort bookkeeping for the sweeper: a row lets it find
/// remote objects for sessions whose local directories are already gone. The
/// record sidecar, not the registry, is the authority for ownership.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRow {
    pub session_id: String,
    pub user_id: String,
    pub storage_prefix: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Trait for durable session registry backends.
pub trait SessionRegistry: Send + Sync {
    /// Insert a row. Re-inserting the same session id overwrites.
    fn insert(&self, row: &SessionRow) -> Result<(), RegistryError>;

    /// Get a row by session id.
    fn get(&self, session_id: &str) -> Result<Option<SessionRow>, RegistryError>;

    /// List rows created before the cutoff, oldest first.
    fn list_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<SessionRow>, RegistryError>;

    /// Delete a row. Deleting an absent row is a no-op.
    fn delete(&self, session_id: &str) -> Result<(), RegistryError>;
}

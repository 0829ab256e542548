//! Error types for the packaging module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while packaging stems for download.
#[derive(Debug, Error)]
pub enum PackagingError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// None of the requested stem files exist on disk.
    #[error("No stem files available to package")]
    NothingToPackage,

    /// Encoding process failed.
    #[error("Encoding failed: {reason}")]
    EncodingFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Encoding timed out.
    #[error("Encoding timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Archive construction failed.
    #[error("Archive error: {0}")]
    Archive(String),

    /// I/O error during packaging.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PackagingError {
    /// Creates a new encoding failed error with stderr output.
    pub fn encoding_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::EncodingFailed {
            reason: reason.into(),
            stderr,
        }
    }
}

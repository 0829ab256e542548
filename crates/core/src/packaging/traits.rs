//! Audio encoder trait.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::error::PackagingError;
use super::types::AudioFormat;

/// Trait for audio encoding backends.
///
/// Packaging treats encoding as a black box: convert one file, or additively
/// mix several into one. The FFmpeg implementation is the production one.
#[async_trait]
pub trait AudioEncoder: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Convert a single audio file to the target format.
    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        format: AudioFormat,
    ) -> Result<(), PackagingError>;

    /// Additively overlay several audio files into one output track.
    async fn mix(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        format: AudioFormat,
    ) -> Result<(), PackagingError>;
}

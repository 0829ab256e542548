//! Mock audio encoder for testing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::packaging::{AudioEncoder, AudioFormat, PackagingError};

/// Mock implementation of the AudioEncoder trait.
///
/// Records every convert and mix call and writes placeholder bytes to the
/// output path so downstream archiving has real files to read.
#[derive(Debug, Default)]
pub struct MockEncoder {
    converts: Arc<RwLock<Vec<(PathBuf, PathBuf, AudioFormat)>>>,
    mixes: Arc<RwLock<Vec<(Vec<PathBuf>, PathBuf, AudioFormat)>>>,
    next_error: Arc<RwLock<Option<PackagingError>>>,
}

impl MockEncoder {
    /// Create a new mock encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the next convert or mix to fail with the given error.
    pub async fn set_next_error(&self, error: PackagingError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get all recorded convert calls as (input, output, format).
    pub async fn recorded_converts(&self) -> Vec<(PathBuf, PathBuf, AudioFormat)> {
        self.converts.read().await.clone()
    }

    /// Get all recorded mix calls as (inputs, output, format).
    pub async fn recorded_mixes(&self) -> Vec<(Vec<PathBuf>, PathBuf, AudioFormat)> {
        self.mixes.read().await.clone()
    }

    async fn write_placeholder(output: &Path) -> Result<(), PackagingError> {
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(output, b"mock encoded audio").await?;
        Ok(())
    }
}

#[async_trait]
impl AudioEncoder for MockEncoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        format: AudioFormat,
    ) -> Result<(), PackagingError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        Self::write_placeholder(output).await?;
        self.converts
            .write()
            .await
            .push((input.to_path_buf(), output.to_path_buf(), format));
        Ok(())
    }

    async fn mix(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        format: AudioFormat,
    ) -> Result<(), PackagingError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        Self::write_placeholder(output).await?;
        self.mixes
            .write()
            .await
            .push((inputs.to_vec(), output.to_path_buf(), format));
        Ok(())
    }
}

//! Stem packaging service.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use super::archive::write_archive;
use super::config::PackagingConfig;
use super::error::PackagingError;
use super::traits::AudioEncoder;
use super::types::{Archive, AudioFormat};

/// Builds downloadable archives from a session's stem files.
///
/// Every build runs in a fresh working directory under the configured work
/// root, so concurrent requests (even for the same session) never collide.
/// Missing stem files are skipped with a warning; only an empty result is an
/// error. Intermediate per-stem files are removed once the archive exists.
pub struct StemPackager {
    config: PackagingConfig,
    encoder: Arc<dyn AudioEncoder>,
}

impl StemPackager {
    pub fn new(config: PackagingConfig, encoder: Arc<dyn AudioEncoder>) -> Self {
        Self { config, encoder }
    }

    async fn create_work_dir(&self) -> Result<PathBuf, PackagingError> {
        let dir = self.config.work_dir.join(uuid::Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Convert the requested stems and bundle them into `Stems_<id>.zip`.
    pub async fn build_stem_archive(
        &self,
        session_dir: &Path,
        session_id: &str,
        stems: &[String],
        format: AudioFormat,
    ) -> Result<Archive, PackagingError> {
        let work_dir = self.create_work_dir().await?;

        match self
            .stem_archive_in(&work_dir, session_dir, session_id, stems, format)
            .await
        {
            Ok(archive) => Ok(archive),
            Err(e) => {
                let _ = tokio::fs::remove_dir_all(&work_dir).await;
                Err(e)
            }
        }
    }

    async fn stem_archive_in(
        &self,
        work_dir: &Path,
        session_dir: &Path,
        session_id: &str,
        stems: &[String],
        format: AudioFormat,
    ) -> Result<Archive, PackagingError> {
        let mut entries = Vec::new();

        for stem in stems {
            let input = session_dir.join(format!("{}.wav", stem));
            if !input.exists() {
                warn!(stem = %stem, session_id = %session_id, "stem file missing, skipping");
                continue;
            }

            let entry_name = format!("{}.{}", stem, format.extension());
            let output = work_dir.join(&entry_name);
            self.encoder.convert(&input, &output, format).await?;
            entries.push((entry_name, output));
        }

        if entries.is_empty() {
            return Err(PackagingError::NothingToPackage);
        }

        let archive_path = work_dir.join(format!("Stems_{}.zip", session_id));
        write_archive(entries.clone(), archive_path.clone()).await?;

        for (_, path) in &entries {
            let _ = tokio::fs::remove_file(path).await;
        }

        debug!(session_id = %session_id, stems = entries.len(), "stem archive built");

        Ok(Archive::new(archive_path, work_dir.to_path_buf()))
    }

    /// Mix the requested stems into one track and bundle it into `Mixdown_<id>.zip`.
    pub async fn build_mixdown(
        &self,
        session_dir: &Path,
        session_id: &str,
        stems: &[String],
        format: AudioFormat,
    ) -> Result<Archive, PackagingError> {
        let work_dir = self.create_work_dir().await?;

        match self
            .mixdown_in(&work_dir, session_dir, session_id, stems, format)
            .await
        {
            Ok(archive) => Ok(archive),
            Err(e) => {
                let _ = tokio::fs::remove_dir_all(&work_dir).await;
                Err(e)
            }
        }
    }

    async fn mixdown_in(
        &self,
        work_dir: &Path,
        session_dir: &Path,
        session_id: &str,
        stems: &[String],
        format: AudioFormat,
    ) -> Result<Archive, PackagingError> {
        let mut inputs = Vec::new();

        for stem in stems {
            let input = session_dir.join(format!("{}.wav", stem));
            if !input.exists() {
                warn!(stem = %stem, session_id = %session_id, "stem file missing, skipping");
                continue;
            }
            inputs.push(input);
        }

        if inputs.is_empty() {
            return Err(PackagingError::NothingToPackage);
        }

        let mix_name = format!("mixdown.{}", format.extension());
        let mix_path = work_dir.join(&mix_name);
        self.encoder.mix(&inputs, &mix_path, format).await?;

        let archive_path = work_dir.join(format!("Mixdown_{}.zip", session_id));
        write_archive(vec![(mix_name, mix_path.clone())], archive_path.clone()).await?;

        let _ = tokio::fs::remove_file(&mix_path).await;

        debug!(session_id = %session_id, inputs = inputs.len(), "mixdown archive built");

        Ok(Archive::new(archive_path, work_dir.to_path_buf()))
    }
}

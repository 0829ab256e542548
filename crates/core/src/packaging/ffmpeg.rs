//! FFmpeg-based audio encoder implementation.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use super::config::PackagingConfig;
use super::error::PackagingError;
use super::traits::AudioEncoder;
use super::types::AudioFormat;

/// FFmpeg-based encoder implementation.
pub struct FfmpegEncoder {
    config: PackagingConfig,
}

impl FfmpegEncoder {
    /// Creates a new FFmpeg encoder with the given configuration.
    pub fn new(config: PackagingConfig) -> Self {
        Self { config }
    }

    /// Creates an encoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(PackagingConfig::default())
    }

    /// Builds ffmpeg arguments for single-file conversion.
    fn build_convert_args(&self, input: &Path, output: &Path, format: AudioFormat) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
        ];

        args.extend(["-c:a".to_string(), format.ffmpeg_codec().to_string()]);

        if format == AudioFormat::Mp3 {
            args.extend([
                "-b:a".to_string(),
                format!("{}k", self.config.mp3_bitrate_kbps),
            ]);
        }

        args.extend([
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
        ]);

        args.push(output.to_string_lossy().to_string());

        args
    }

    /// Builds ffmpeg arguments for additively mixing inputs into one track.
    fn build_mix_args(&self, inputs: &[PathBuf], output: &Path, format: AudioFormat) -> Vec<String> {
        let mut args = vec!["-y".to_string()];

        for input in inputs {
            args.extend(["-i".to_string(), input.to_string_lossy().to_string()]);
        }

        // amix scales each input down, so the overlay cannot clip.
        args.extend([
            "-filter_complex".to_string(),
            format!("amix=inputs={}:duration=longest", inputs.len()),
        ]);

        args.extend(["-c:a".to_string(), format.ffmpeg_codec().to_string()]);

        if format == AudioFormat::Mp3 {
            args.extend([
                "-b:a".to_string(),
                format!("{}k", self.config.mp3_bitrate_kbps),
            ]);
        }

        args.extend([
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
        ]);

        args.push(output.to_string_lossy().to_string());

        args
    }

    /// Runs ffmpeg with the given arguments, enforcing the configured timeout.
    async fn run_ffmpeg(&self, args: &[String], output: &Path) -> Result<(), PackagingError> {
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PackagingError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    PackagingError::Io(e)
                }
            })?;

        let mut stderr = child.stderr.take().expect("stderr should be captured");

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut stderr_output = String::new();
            let _ = stderr.read_to_string(&mut stderr_output).await;
            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, String), std::io::Error>((status, stderr_output))
        })
        .await;

        match result {
            Ok(Ok((status, stderr_output))) => {
                if !status.success() {
                    return Err(PackagingError::encoding_failed(
                        format!("ffmpeg exited with code: {:?}", status.code()),
                        if stderr_output.is_empty() {
                            None
                        } else {
                            Some(stderr_output)
                        },
                    ));
                }
            }
            Ok(Err(e)) => return Err(PackagingError::Io(e)),
            Err(_) => {
                let _ = child.kill().await;
                return Err(PackagingError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        }

        // Verify output exists and is non-empty
        let meta = tokio::fs::metadata(output)
            .await
            .map_err(|_| PackagingError::encoding_failed("Output file not created", None))?;
        if meta.len() == 0 {
            return Err(PackagingError::encoding_failed("Output file is empty", None));
        }

        Ok(())
    }
}

#[async_trait]
impl AudioEncoder for FfmpegEncoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        format: AudioFormat,
    ) -> Result<(), PackagingError> {
        let args = self.build_convert_args(input, output, format);
        self.run_ffmpeg(&args, output).await
    }

    async fn mix(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        format: AudioFormat,
    ) -> Result<(), PackagingError> {
        if inputs.is_empty() {
            return Err(PackagingError::NothingToPackage);
        }
        let args = self.build_mix_args(inputs, output, format);
        self.run_ffmpeg(&args, output).await
    }
}

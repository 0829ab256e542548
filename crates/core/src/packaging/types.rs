//! Types for the packaging module.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Target audio format for packaged downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Wav,
    Mp3,
    Flac,
}

impl AudioFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Flac => "flac",
        }
    }

    /// FFmpeg codec name for this format.
    pub fn ffmpeg_codec(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "pcm_s16le",
            AudioFormat::Mp3 => "libmp3lame",
            AudioFormat::Flac => "flac",
        }
    }

    /// Parse a user-supplied format name, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "wav" => Some(AudioFormat::Wav),
            "mp3" => Some(AudioFormat::Mp3),
            "flac" => Some(AudioFormat::Flac),
            _ => None,
        }
    }
}

/// A built archive and the working directory that holds it.
///
/// The working directory contains nothing but the archive once packaging
/// finishes. Call [`Archive::discard`] after the bytes have been served.
#[derive(Debug)]
pub struct Archive {
    /// Path of the archive file.
    pub path: PathBuf,
    work_dir: PathBuf,
}

impl Archive {
    pub(crate) fn new(path: PathBuf, work_dir: PathBuf) -> Self {
        Self { path, work_dir }
    }

    /// Suggested download filename, derived from the archive path.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "archive.zip".to_string())
    }

    /// Remove the archive and its working directory.
    pub async fn discard(self) {
        let _ = tokio::fs::remove_dir_all(&self.work_dir).await;
    }
}

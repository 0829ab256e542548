//! Configuration for the packaging module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for stem packaging and mixdown encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagingConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Root directory for per-request working directories.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Timeout for a single encode or mix in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Bitrate for mp3 output.
    #[serde(default = "default_mp3_bitrate")]
    pub mp3_bitrate_kbps: u32,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("stemsplit-packaging")
}

fn default_timeout() -> u64 {
    120
}

fn default_mp3_bitrate() -> u32 {
    192
}

fn default_log_level() -> String {
    "warning".to_string()
}

impl Default for PackagingConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            work_dir: default_work_dir(),
            timeout_secs: default_timeout(),
            mp3_bitrate_kbps: default_mp3_bitrate(),
            ffmpeg_log_level: default_log_level(),
        }
    }
}

impl PackagingConfig {
    /// Sets the ffmpeg binary path.
    pub fn with_ffmpeg_path(mut self, path: PathBuf) -> Self {
        self.ffmpeg_path = path;
        self
    }

    /// Sets the working directory root.
    pub fn with_work_dir(mut self, work_dir: PathBuf) -> Self {
        self.work_dir = work_dir;
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

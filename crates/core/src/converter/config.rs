//! `[converter]` settings for the FFmpeg transcoder.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Parent of the per-job working directories.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Hard limit for one ffmpeg run, independent of the engine's job timeout.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Passed to `-loglevel`.
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,

    /// Overrides the per-codec bitrate of lossy audio targets.
    #[serde(default)]
    pub audio_bitrate_kbps: Option<u32>,

    /// Overrides the per-codec CRF of video targets that use one.
    #[serde(default)]
    pub video_crf: Option<u8>,

    /// Inserted right before the output path.
    #[serde(default)]
    pub extra_ffmpeg_args: Vec<String>,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("convertino")
}

fn default_timeout() -> u64 {
    1800
}

fn default_log_level() -> String {
    "error".to_string()
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            temp_dir: default_temp_dir(),
            timeout_secs: default_timeout(),
            ffmpeg_log_level: default_log_level(),
            audio_bitrate_kbps: None,
            video_crf: None,
            extra_ffmpeg_args: Vec::new(),
        }
    }
}

impl ConverterConfig {
    pub fn with_ffmpeg_path(mut self, ffmpeg_path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = ffmpeg_path.into();
        self
    }

    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

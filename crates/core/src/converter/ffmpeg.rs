//! FFmpeg-based transcoder implementation.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tempfile::TempDir;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::Transcoder;
use super::types::{AudioEncoding, TranscodeOutput, TranscodeRequest, VideoEncoding};
use crate::format::{MediaCategory, MediaFormat};

/// Maximum number of stderr bytes kept on a failed run.
const STDERR_TAIL_BYTES: usize = 4096;

/// Transcoder that shells out to `ffmpeg` for audio, video and raster images.
pub struct FfmpegTranscoder {
    config: ConverterConfig,
}

impl FfmpegTranscoder {
    /// Creates a new FFmpeg transcoder with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Builds the ffmpeg argument list for a conversion.
    fn build_args(
        &self,
        input_path: &Path,
        output_path: &Path,
        source: &MediaFormat,
        target: &MediaFormat,
    ) -> Result<Vec<String>, ConverterError> {
        let mut args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
        ];

        let unsupported = || ConverterError::UnsupportedConversion {
            source_ext: source.extension().to_string(),
            target_ext: target.extension().to_string(),
        };

        match target.category() {
            MediaCategory::Audio => {
                let audio = AudioEncoding::for_extension(target.extension()).ok_or_else(unsupported)?;
                // Drop any video or cover-art stream
                args.push("-vn".to_string());
                args.extend(["-c:a".to_string(), audio.codec.to_string()]);
                if let Some(bitrate) = audio.bitrate_kbps {
                    let bitrate = self.config.audio_bitrate_kbps.unwrap_or(bitrate);
                    args.extend(["-b:a".to_string(), format!("{}k", bitrate)]);
                }
                if target.extension() == "aac" {
                    args.extend(["-f".to_string(), "adts".to_string()]);
                }
            }
            MediaCategory::Video => {
                let video = VideoEncoding::for_extension(target.extension()).ok_or_else(unsupported)?;
                args.extend(["-c:v".to_string(), video.video_codec.to_string()]);
                if let Some(crf) = video.crf {
                    let crf = self.config.video_crf.unwrap_or(crf);
                    args.extend(["-crf".to_string(), crf.to_string()]);
                }
                if video.video_codec == "libvpx-vp9" {
                    args.extend(["-b:v".to_string(), "0".to_string()]);
                }
                args.extend(["-c:a".to_string(), video.audio_codec.to_string()]);
            }
            MediaCategory::Image => {
                // Single frame output
                args.extend(["-frames:v".to_string(), "1".to_string()]);
                if matches!(target.extension(), "jpg" | "jpeg") {
                    args.extend(["-q:v".to_string(), "2".to_string()]);
                }
            }
            MediaCategory::Document | MediaCategory::Other => return Err(unsupported()),
        }

        args.extend(self.config.extra_ffmpeg_args.iter().cloned());
        args.push(output_path.to_string_lossy().to_string());

        Ok(args)
    }

    /// Creates a working directory for a single job under the temp dir.
    ///
    /// The directory is removed when the returned guard drops, including
    /// when the transcode future is dropped mid-run.
    async fn work_dir(&self, job_id: &str) -> Result<TempDir, ConverterError> {
        let root = self.config.temp_dir.clone();
        let failed = || ConverterError::WorkDirFailed { path: root.join(job_id) };
        tokio::fs::create_dir_all(&root).await.map_err(|_| failed())?;
        tempfile::Builder::new()
            .prefix(&format!("{}-", job_id))
            .tempdir_in(&root)
            .map_err(|_| failed())
    }

    async fn run_ffmpeg(&self, args: &[String]) -> Result<(), ConverterError> {
        let child = Command::new(&self.config.ffmpeg_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConverterError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    ConverterError::Io(e)
                }
            })?;

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        // Dropping the future on timeout kills the child (kill_on_drop)
        let output = match timeout(timeout_duration, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ConverterError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                })
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail = tail_of(&stderr, STDERR_TAIL_BYTES);
            return Err(ConverterError::conversion_failed(
                format!("FFmpeg exited with code: {:?}", output.status.code()),
                if tail.is_empty() { None } else { Some(tail) },
            ));
        }

        Ok(())
    }
}

/// Returns at most `max` trailing bytes of `text`, cut on a char boundary.
fn tail_of(text: &str, max: usize) -> String {
    let trimmed = text.trim();
    if trimmed.len() <= max {
        return trimmed.to_string();
    }
    let mut start = trimmed.len() - max;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    trimmed[start..].to_string()
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn supports(&self, source: &MediaFormat, target: &MediaFormat) -> bool {
        match (source.category(), target.category()) {
            (MediaCategory::Audio, MediaCategory::Audio)
            | (MediaCategory::Video, MediaCategory::Audio) => {
                AudioEncoding::for_extension(target.extension()).is_some()
            }
            (MediaCategory::Video, MediaCategory::Video) => {
                VideoEncoding::for_extension(target.extension()).is_some()
            }
            // ffmpeg neither rasterizes nor writes vector graphics
            (MediaCategory::Image, MediaCategory::Image) => {
                source.extension() != "svg" && target.extension() != "svg"
            }
            _ => false,
        }
    }

    async fn transcode(
        &self,
        request: TranscodeRequest,
    ) -> Result<TranscodeOutput, ConverterError> {
        if !self.supports(&request.source, &request.target) {
            return Err(ConverterError::UnsupportedConversion {
                source_ext: request.source.extension().to_string(),
                target_ext: request.target.extension().to_string(),
            });
        }

        let start = Instant::now();
        let work_dir = self.work_dir(&request.job_id).await?;
        let input_path = work_dir.path().join(format!("input.{}", request.source.extension()));
        let output_path = work_dir.path().join(format!("output.{}", request.target.extension()));

        let result = async {
            tokio::fs::write(&input_path, &request.input).await?;
            let args =
                self.build_args(&input_path, &output_path, &request.source, &request.target)?;
            debug!(job_id = %request.job_id, ?args, "Running ffmpeg");
            self.run_ffmpeg(&args).await?;
            let bytes = tokio::fs::read(&output_path).await.map_err(|e| {
                ConverterError::conversion_failed(format!("Output file not readable: {}", e), None)
            })?;
            if bytes.is_empty() {
                return Err(ConverterError::EmptyOutput);
            }
            Ok(bytes)
        }
        .await;

        let work_path = work_dir.path().to_path_buf();
        if let Err(e) = work_dir.close() {
            warn!("Failed to clean up {:?}: {}", work_path, e);
        }

        let bytes = result?;
        Ok(TranscodeOutput {
            bytes,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        let result = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await;

        if let Err(e) = result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(ConverterError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                });
            }
            return Err(ConverterError::Io(e));
        }

        // Ensure temp dir exists
        tokio::fs::create_dir_all(&self.config.temp_dir).await?;

        Ok(())
    }
}

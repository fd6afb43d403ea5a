//! Types for the converter module.

use std::sync::Arc;

use crate::format::{file_stem, MediaFormat};

/// A single-file transcode request handed to a [`Transcoder`](super::Transcoder).
#[derive(Debug, Clone)]
pub struct TranscodeRequest {
    /// Job the request belongs to, used for working file names and logs.
    pub job_id: String,
    /// Original file name as submitted.
    pub source_name: String,
    /// Format of the input bytes.
    pub source: MediaFormat,
    /// Format to produce.
    pub target: MediaFormat,
    /// Source bytes.
    pub input: Arc<[u8]>,
}

impl TranscodeRequest {
    /// Output file name: the source stem with the target extension.
    pub fn output_name(&self) -> String {
        format!("{}.{}", file_stem(&self.source_name), self.target.extension())
    }
}

/// Output of a successful transcode.
#[derive(Debug, Clone)]
pub struct TranscodeOutput {
    /// Converted bytes.
    pub bytes: Vec<u8>,
    /// Wall time spent transcoding in milliseconds.
    pub duration_ms: u64,
}

/// Audio codec settings used for a target extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioEncoding {
    /// ffmpeg encoder name.
    pub codec: &'static str,
    /// Bitrate in kbps for lossy codecs.
    pub bitrate_kbps: Option<u32>,
}

impl AudioEncoding {
    /// Encoder for an audio target extension.
    pub fn for_extension(ext: &str) -> Option<Self> {
        let (codec, bitrate_kbps) = match ext {
            "mp3" => ("libmp3lame", Some(320)),
            "wav" => ("pcm_s16le", None),
            "ogg" => ("libvorbis", Some(320)),
            "flac" => ("flac", None),
            "aac" | "m4a" => ("aac", Some(256)),
            _ => return None,
        };
        Some(Self {
            codec,
            bitrate_kbps,
        })
    }

    /// Whether the codec is lossless (no bitrate argument).
    pub fn is_lossless(&self) -> bool {
        self.bitrate_kbps.is_none()
    }
}

/// Video codec settings used for a target container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoEncoding {
    /// ffmpeg video encoder.
    pub video_codec: &'static str,
    /// ffmpeg audio encoder for the soundtrack.
    pub audio_codec: &'static str,
    /// Constant rate factor, if the encoder supports it.
    pub crf: Option<u8>,
}

impl VideoEncoding {
    /// Encoder pair for a video target extension.
    pub fn for_extension(ext: &str) -> Option<Self> {
        let (video_codec, audio_codec, crf) = match ext {
            "mp4" | "mov" | "mkv" => ("libx264", "aac", Some(23)),
            "webm" => ("libvpx-vp9", "libopus", Some(31)),
            "avi" => ("mpeg4", "libmp3lame", None),
            "wmv" => ("wmv2", "wmav2", None),
            "flv" => ("flv", "libmp3lame", None),
            _ => return None,
        };
        Some(Self {
            video_codec,
            audio_codec,
            crf,
        })
    }
}

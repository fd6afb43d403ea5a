//! Converter module for transcoding media bytes.
//!
//! This module provides the `Transcoder` capability trait, a `TranscoderSet`
//! that picks the implementation for a `{source, target}` pair, and an
//! FFmpeg-backed implementation.
//!
//! # Features
//!
//! - Audio transcoding (MP3, WAV, OGG Vorbis, FLAC, AAC/M4A)
//! - Video transcoding (H.264, VP9, MPEG-4, WMV, FLV containers)
//! - Audio track extraction from video
//! - Raster image conversion
//!
//! # Example
//!
//! ```ignore
//! use convertino_core::converter::{FfmpegTranscoder, TranscoderSet};
//! use convertino_core::format::MediaFormat;
//!
//! let set = TranscoderSet::new().with(Arc::new(FfmpegTranscoder::with_defaults()));
//! set.validate_all().await?;
//!
//! let transcoder = set.select(&MediaFormat::new("flac"), &MediaFormat::new("mp3"))?;
//! let output = transcoder.transcode(request).await?;
//! println!("Converted in {} ms", output.duration_ms);
//! ```

mod config;
mod error;
mod ffmpeg;
mod set;
mod traits;
mod types;

pub use config::ConverterConfig;
pub use error::ConverterError;
pub use ffmpeg::FfmpegTranscoder;
pub use set::TranscoderSet;
pub use traits::Transcoder;
pub use types::{AudioEncoding, TranscodeOutput, TranscodeRequest, VideoEncoding};

//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

use crate::format::MediaCategory;

/// Errors that can occur while transcoding a single file.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// No registered transcoder handles this source/target pair.
    #[error("No transcoder available for {category} conversion {source_ext} -> {target_ext}")]
    NoTranscoder {
        category: MediaCategory,
        source_ext: String,
        target_ext: String,
    },

    /// The transcoder was asked for a pair it does not support.
    #[error("Unsupported conversion: {source_ext} -> {target_ext}")]
    UnsupportedConversion {
        source_ext: String,
        target_ext: String,
    },

    /// Source bytes could not be read.
    #[error("Failed to read source {name}: {reason}")]
    SourceUnreadable { name: String, reason: String },

    /// Failed to prepare the working directory.
    #[error("Failed to create working directory: {path}")]
    WorkDirFailed { path: PathBuf },

    /// Conversion process failed.
    #[error("Conversion failed: {reason}")]
    ConversionFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// The transcoder produced no output bytes.
    #[error("Conversion produced an empty output")]
    EmptyOutput,

    /// Conversion timed out.
    #[error("Conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The transcoder panicked; the job fails, the worker survives.
    #[error("Transcoder panicked: {reason}")]
    Panicked { reason: String },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Job was cancelled.
    #[error("Conversion cancelled")]
    Cancelled,
}

impl ConverterError {
    /// Creates a new conversion failed error with stderr output.
    pub fn conversion_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a source unreadable error.
    pub fn source_unreadable(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnreadable {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Builds a [`ConverterError::Panicked`] from a caught panic payload.
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Self::Panicked { reason }
    }

    /// Whether resubmitting the same file could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Io(_))
    }
}

//! Error types for the conversion engine.

use thiserror::Error;

use crate::job::BatchId;

/// Reasons a batch is refused at submit time. No jobs are created.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Batch contains no files")]
    EmptyBatch,

    #[error("File '{file_name}' has format '{actual}', batch declares '{expected}'")]
    SourceMismatch {
        file_name: String,
        expected: String,
        actual: String,
    },

    #[error("Cannot convert '{source_format}' to '{target_format}'")]
    IncompatibleTarget {
        source_format: String,
        target_format: String,
    },
}

impl ValidationError {
    /// Short label used in metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::EmptyBatch => "empty_batch",
            ValidationError::SourceMismatch { .. } => "source_mismatch",
            ValidationError::IncompatibleTarget { .. } => "incompatible_target",
        }
    }
}

/// Errors returned by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid batch: {0}")]
    Validation(#[from] ValidationError),

    #[error("Batch not found: {0}")]
    BatchNotFound(BatchId),

    #[error("Batch {0} still has unfinished jobs")]
    BatchInProgress(BatchId),
}

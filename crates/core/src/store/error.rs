//! Error types for the result store.

use thiserror::Error;

use crate::job::JobId;

/// Errors returned when looking up an artifact.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Nothing was ever stored for this job, or it was removed explicitly.
    #[error("No artifact for job {0}")]
    NotFound(JobId),

    /// The artifact existed but its TTL elapsed.
    #[error("Artifact for job {0} has expired")]
    Expired(JobId),

    /// The retrieval token does not match the artifact.
    #[error("Invalid retrieval token for job {0}")]
    InvalidHandle(JobId),
}

//! Artifact types held by the result store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::format::MediaFormat;
use crate::job::JobId;

/// Opaque token plus expiry authorizing download of one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalHandle {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Converted output handed to the store by a finished job.
#[derive(Debug, Clone)]
pub struct ArtifactPayload {
    /// Output file name, `<source stem>.<target ext>`.
    pub file_name: String,
    pub target_format: MediaFormat,
    pub bytes: Vec<u8>,
}

/// A stored conversion result.
#[derive(Debug)]
pub struct ResultArtifact {
    pub job_id: JobId,
    pub file_name: String,
    pub target_format: MediaFormat,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub retrieval: RetrievalHandle,
}

impl ResultArtifact {
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Metadata view without the bytes, as attached to a finished job.
    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            job_id: self.job_id,
            file_name: self.file_name.clone(),
            size_bytes: self.size_bytes(),
            target_format: self.target_format.extension().to_string(),
            content_type: self.content_type.to_string(),
            created_at: self.created_at,
            retrieval: self.retrieval.clone(),
        }
    }
}

/// Artifact metadata reported in job snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSummary {
    pub job_id: JobId,
    pub file_name: String,
    pub size_bytes: u64,
    pub target_format: String,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
    pub retrieval: RetrievalHandle,
}

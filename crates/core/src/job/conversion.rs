//! The conversion job record and its state machine.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::source::SourceFile;
use super::types::{BatchId, JobError, JobId, JobState};
use crate::format::MediaFormat;
use crate::store::ArtifactSummary;

/// Rejected state change.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Illegal transition for job {job_id}: {from} -> {to}")]
pub struct JobTransitionError {
    pub job_id: JobId,
    pub from: JobState,
    pub to: JobState,
}

/// One file's conversion request and its lifecycle.
///
/// Fields are only changed through the transition methods, which enforce
/// the monotonic state machine and keep `artifact` / `error` consistent
/// with the state: once terminal, exactly one of them is set.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionJob {
    id: JobId,
    batch_id: BatchId,
    source_name: String,
    source_size_bytes: u64,
    source_format: MediaFormat,
    target_format: MediaFormat,
    state: JobState,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    artifact: Option<ArtifactSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JobError>,
}

/// A point-in-time copy of a job, as returned by status queries.
pub type JobSnapshot = ConversionJob;

impl ConversionJob {
    /// Creates a pending job for `file`.
    ///
    /// Compatibility of the formats is checked by the engine before any job
    /// of a batch is created.
    pub fn new(
        batch_id: BatchId,
        file: &SourceFile,
        source_format: MediaFormat,
        target_format: MediaFormat,
    ) -> Self {
        Self {
            id: JobId::new(),
            batch_id,
            source_name: file.name.clone(),
            source_size_bytes: file.size_bytes,
            source_format,
            target_format,
            state: JobState::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            artifact: None,
            error: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn batch_id(&self) -> BatchId {
        self.batch_id
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn source_size_bytes(&self) -> u64 {
        self.source_size_bytes
    }

    pub fn source_format(&self) -> &MediaFormat {
        &self.source_format
    }

    pub fn target_format(&self) -> &MediaFormat {
        &self.target_format
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn artifact(&self) -> Option<&ArtifactSummary> {
        self.artifact.as_ref()
    }

    pub fn error(&self) -> Option<&JobError> {
        self.error.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// `Pending -> Running`.
    pub fn start(&mut self) -> Result<(), JobTransitionError> {
        self.transition(JobState::Running)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// `Running -> Succeeded`, attaching the stored artifact.
    pub fn succeed(&mut self, artifact: ArtifactSummary) -> Result<(), JobTransitionError> {
        self.transition(JobState::Succeeded)?;
        self.artifact = Some(artifact);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// `Running -> Failed`.
    pub fn fail(&mut self, error: JobError) -> Result<(), JobTransitionError> {
        self.transition(JobState::Failed)?;
        self.error = Some(error);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// `Pending | Running -> Cancelled`.
    pub fn cancel(&mut self) -> Result<(), JobTransitionError> {
        self.transition(JobState::Cancelled)?;
        self.error = Some(JobError::cancelled());
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    fn transition(&mut self, next: JobState) -> Result<(), JobTransitionError> {
        if !self.state.can_transition_to(next) {
            return Err(JobTransitionError {
                job_id: self.id,
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}

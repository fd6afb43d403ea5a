//! Batch, outcome and pool types for the conversion engine.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::job::{BatchId, ConversionJob, JobError, JobId, JobState, SourceFile};
use crate::store::ArtifactSummary;

/// A set of files sharing one declared source format and one target format.
#[derive(Debug, Clone)]
pub struct ConversionBatch {
    pub source_format: String,
    pub target_format: String,
    pub files: Vec<SourceFile>,
}

impl ConversionBatch {
    pub fn new(source_format: impl Into<String>, target_format: impl Into<String>) -> Self {
        Self {
            source_format: source_format.into(),
            target_format: target_format.into(),
            files: Vec::new(),
        }
    }

    /// Adds a file to the batch.
    pub fn with_file(mut self, file: SourceFile) -> Self {
        self.files.push(file);
        self
    }

    pub fn with_files(mut self, files: impl IntoIterator<Item = SourceFile>) -> Self {
        self.files.extend(files);
        self
    }
}

/// Returned by `submit`: the batch id and one job id per file, in file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchHandle {
    pub batch_id: BatchId,
    pub job_ids: Vec<JobId>,
}

/// Result of waiting on a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JobOutcome {
    Succeeded { artifact: ArtifactSummary },
    Failed { error: JobError },
    Cancelled,
    /// The caller's wait elapsed before the job finished. The job keeps
    /// running.
    Timeout,
}

impl JobOutcome {
    /// Outcome for the current state of `job`.
    pub fn from_job(job: &ConversionJob) -> Self {
        match job.state() {
            JobState::Succeeded => match job.artifact() {
                Some(artifact) => JobOutcome::Succeeded {
                    artifact: artifact.clone(),
                },
                None => JobOutcome::Timeout,
            },
            JobState::Failed => match job.error() {
                Some(error) => JobOutcome::Failed {
                    error: error.clone(),
                },
                None => JobOutcome::Timeout,
            },
            JobState::Cancelled => JobOutcome::Cancelled,
            JobState::Pending | JobState::Running => JobOutcome::Timeout,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, JobOutcome::Timeout)
    }
}

/// Per-state job counts of one batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub batch_id: BatchId,
    pub source_format: String,
    pub target_format: String,
    pub created_at: DateTime<Utc>,
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl BatchSummary {
    pub fn is_finished(&self) -> bool {
        self.pending == 0 && self.running == 0
    }
}

/// Status of the worker pool.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    pub active_jobs: usize,
    pub queued_jobs: usize,
    pub max_concurrent: usize,
    pub total_succeeded: u64,
    pub total_failed: u64,
    pub total_cancelled: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::MediaFormat;

    #[test]
    fn test_outcome_for_unfinished_job_is_timeout() {
        let file = SourceFile::inline("a.mp3", b"x".to_vec());
        let job = ConversionJob::new(
            BatchId::new(),
            &file,
            MediaFormat::new("mp3"),
            MediaFormat::new("wav"),
        );
        assert!(JobOutcome::from_job(&job).is_timeout());
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(JobOutcome::Cancelled).unwrap();
        assert_eq!(json["outcome"], "cancelled");
    }

    #[test]
    fn test_batch_builder() {
        let batch = ConversionBatch::new("mp3", "wav")
            .with_file(SourceFile::inline("a.mp3", b"a".to_vec()))
            .with_files(vec![SourceFile::inline("b.mp3", b"b".to_vec())]);
        assert_eq!(batch.files.len(), 2);
    }
}

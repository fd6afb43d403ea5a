//! Conversion batch API handlers.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use convertino_core::{
    BatchHandle, BatchId, BatchSummary, ConversionBatch, Identity, JobId, JobOutcome,
    JobSnapshot, SourceFile,
};

use super::error::ApiError;
use super::middleware::Caller;
use crate::state::AppState;

/// Wait used when `timeout_ms` is not given, before applying the cap.
const DEFAULT_WAIT_MS: u64 = 30_000;

// ============================================================================
// Request/Response types
// ============================================================================

/// Request body for a batch of server-local files
#[derive(Debug, Deserialize)]
pub struct CreateConversionBody {
    pub source_format: String,
    pub target_format: String,
    pub files: Vec<FileRef>,
}

/// A server-local source file, absolute or relative to `server.source_dir`
#[derive(Debug, Deserialize)]
pub struct FileRef {
    pub path: PathBuf,
    /// Display name; defaults to the path's file name.
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WaitParams {
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// A job snapshot plus where to download its artifact.
#[derive(Debug, Serialize)]
pub struct JobResponse {
    #[serde(flatten)]
    pub job: JobSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl From<JobSnapshot> for JobResponse {
    fn from(job: JobSnapshot) -> Self {
        let download_url = job.artifact().map(|artifact| {
            format!(
                "/api/v1/artifacts/{}?token={}",
                artifact.job_id, artifact.retrieval.token
            )
        });
        Self { job, download_url }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchListResponse {
    pub batches: Vec<BatchSummary>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct BatchStatusResponse {
    pub batch_id: BatchId,
    pub jobs: BTreeMap<JobId, JobResponse>,
}

#[derive(Debug, Serialize)]
pub struct BatchWaitResponse {
    pub batch_id: BatchId,
    /// False when at least one job was still unfinished at the deadline.
    pub finished: bool,
    pub outcomes: BTreeMap<JobId, JobOutcome>,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub batch_id: BatchId,
    /// Jobs that were not yet terminal when cancellation was requested.
    pub cancelled: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/conversions
///
/// Submit a batch of files already present under the configured
/// `server.source_dir`. 403 when no source directory is configured.
pub async fn create_conversion(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Json(body): Json<CreateConversionBody>,
) -> Result<(StatusCode, Json<BatchHandle>), ApiError> {
    let root = state.source_root().ok_or_else(|| {
        ApiError::Forbidden("Server-local sources are disabled; upload the files".to_string())
    })?;

    let mut batch = ConversionBatch::new(body.source_format, body.target_format);
    for (index, file) in body.files.into_iter().enumerate() {
        let source = root.open(&file.path, file.name).await.map_err(|e| {
            debug!(index, error = ?e, submitted_by = %caller, "Refused server-local source");
            ApiError::BadRequest(format!("files[{}]: {}", index, e))
        })?;
        batch = batch.with_file(source);
    }

    submit(&state, batch, &caller).await
}

/// POST /api/v1/conversions/upload
///
/// Submit a batch of uploaded files. Multipart fields: `source_format`,
/// `target_format` and one `files` part per file.
pub async fn upload_conversion(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<BatchHandle>), ApiError> {
    let mut source_format: Option<String> = None;
    let mut target_format: Option<String> = None;
    let mut files: Vec<SourceFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "source_format" => {
                source_format = Some(read_text(field).await?);
            }
            "target_format" => {
                target_format = Some(read_text(field).await?);
            }
            "files" => {
                let file_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| {
                        ApiError::BadRequest("Uploaded file has no file name".to_string())
                    })?;
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read file {}: {}", file_name, e))
                })?;
                files.push(SourceFile::inline(file_name, bytes.to_vec()));
            }
            other => debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    let source_format = source_format
        .ok_or_else(|| ApiError::BadRequest("Missing field: source_format".to_string()))?;
    let target_format = target_format
        .ok_or_else(|| ApiError::BadRequest("Missing field: target_format".to_string()))?;

    let batch = ConversionBatch::new(source_format, target_format).with_files(files);
    submit(&state, batch, &caller).await
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    let name = field.name().unwrap_or("").to_string();
    field
        .text()
        .await
        .map(|text| text.trim().to_string())
        .map_err(|e| ApiError::BadRequest(format!("Failed to read field {}: {}", name, e)))
}

async fn submit(
    state: &AppState,
    batch: ConversionBatch,
    caller: &Identity,
) -> Result<(StatusCode, Json<BatchHandle>), ApiError> {
    let files = batch.files.len();
    let handle = state.engine().submit(batch).await?;
    info!(
        batch_id = %handle.batch_id,
        files,
        submitted_by = %caller,
        "Accepted conversion batch"
    );
    Ok((StatusCode::ACCEPTED, Json(handle)))
}

/// GET /api/v1/conversions
pub async fn list_conversions(State(state): State<Arc<AppState>>) -> Json<BatchListResponse> {
    let batches = state.engine().batches().await;
    let count = batches.len();
    Json(BatchListResponse { batches, count })
}

/// GET /api/v1/conversions/{batch_id}
pub async fn get_conversion(
    State(state): State<Arc<AppState>>,
    Path(batch_id): Path<BatchId>,
) -> Result<Json<BatchStatusResponse>, ApiError> {
    let jobs = state
        .engine()
        .status(&batch_id)
        .await?
        .into_iter()
        .map(|(id, job)| (id, JobResponse::from(job)))
        .collect();

    Ok(Json(BatchStatusResponse { batch_id, jobs }))
}

/// GET /api/v1/conversions/{batch_id}/wait?timeout_ms=
///
/// Blocks until the batch finishes or the (capped) timeout elapses.
pub async fn wait_conversion(
    State(state): State<Arc<AppState>>,
    Path(batch_id): Path<BatchId>,
    Query(params): Query<WaitParams>,
) -> Result<Json<BatchWaitResponse>, ApiError> {
    let cap = state.engine().config().await_timeout_cap();
    let timeout = Duration::from_millis(params.timeout_ms.unwrap_or(DEFAULT_WAIT_MS)).min(cap);

    let outcomes = state.engine().await_batch(&batch_id, timeout).await?;
    let finished = !outcomes.values().any(JobOutcome::is_timeout);

    Ok(Json(BatchWaitResponse {
        batch_id,
        finished,
        outcomes,
    }))
}

/// DELETE /api/v1/conversions/{batch_id}
pub async fn cancel_conversion(
    State(state): State<Arc<AppState>>,
    Path(batch_id): Path<BatchId>,
) -> Result<Json<CancelResponse>, ApiError> {
    let cancelled = state.engine().cancel(&batch_id).await?;
    Ok(Json(CancelResponse {
        batch_id,
        cancelled,
    }))
}

/// DELETE /api/v1/conversions/{batch_id}/record
///
/// Drops the records of a finished batch; artifacts stay until their TTL.
pub async fn forget_conversion(
    State(state): State<Arc<AppState>>,
    Path(batch_id): Path<BatchId>,
) -> Result<StatusCode, ApiError> {
    state.engine().forget(&batch_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/jobs/{job_id}
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<JobId>,
) -> Result<Json<JobResponse>, ApiError> {
    state
        .engine()
        .job(&job_id)
        .await
        .map(|job| Json(JobResponse::from(job)))
        .ok_or_else(|| ApiError::NotFound(format!("Job not found: {}", job_id)))
}

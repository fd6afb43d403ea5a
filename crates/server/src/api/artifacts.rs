//! Artifact download and cloud hand-off handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use convertino_core::{AccessToken, CloudError, JobId, UploadReceipt};

use super::error::ApiError;
use crate::state::AppState;

/// Bearer token for the storage API.
pub const STORAGE_TOKEN_HEADER: &str = "x-storage-token";
/// Optional RFC 3339 expiry of the storage token.
pub const STORAGE_TOKEN_EXPIRES_HEADER: &str = "x-storage-token-expires-at";

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CloudUploadBody {
    /// Destination folder; empty or `root` for the root folder.
    #[serde(default)]
    pub folder_path: Option<String>,
}

/// GET /api/v1/artifacts/{job_id}?token=
///
/// 404 when unknown, 410 when expired, 403 when the token does not match.
pub async fn download_artifact(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<JobId>,
    Query(params): Query<DownloadParams>,
) -> Result<impl IntoResponse, ApiError> {
    let token = params
        .token
        .ok_or_else(|| ApiError::Forbidden("Retrieval token required".to_string()))?;
    let artifact = state.store().get_by_token(&job_id, &token).await?;

    let headers = [
        (header::CONTENT_TYPE, artifact.content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            content_disposition(&artifact.file_name),
        ),
    ];
    Ok((headers, artifact.bytes.clone()))
}

fn content_disposition(file_name: &str) -> String {
    let sanitized: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("attachment; filename=\"{}\"", sanitized)
}

/// DELETE /api/v1/artifacts/{job_id}
pub async fn delete_artifact(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<JobId>,
) -> Result<StatusCode, ApiError> {
    match state.store().remove(&job_id).await {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(ApiError::NotFound(format!("No artifact for job {}", job_id))),
    }
}

/// POST /api/v1/artifacts/{job_id}/cloud
///
/// Upload an artifact to the storage proxy with the caller's token.
pub async fn upload_to_cloud(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<JobId>,
    headers: HeaderMap,
    Json(body): Json<CloudUploadBody>,
) -> Result<Json<UploadReceipt>, ApiError> {
    let uploader = state
        .cloud()
        .ok_or_else(|| ApiError::ServiceUnavailable("Cloud storage not configured".to_string()))?;

    let token = access_token(&headers)?;
    let artifact = state.store().get(&job_id).await?;

    let receipt = uploader
        .upload(&token, &artifact, body.folder_path.as_deref())
        .await?;

    info!(
        job_id = %job_id,
        file_name = %receipt.file_name,
        folder = ?receipt.folder_path,
        uploader = uploader.name(),
        "Artifact handed off to cloud storage"
    );
    Ok(Json(receipt))
}

fn access_token(headers: &HeaderMap) -> Result<AccessToken, ApiError> {
    let value = headers
        .get(STORAGE_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(CloudError::MissingToken)?;

    let token = AccessToken::new(value);
    match headers.get(STORAGE_TOKEN_EXPIRES_HEADER) {
        None => Ok(token),
        Some(raw) => {
            let expires_at = raw
                .to_str()
                .ok()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|at| at.with_timezone(&Utc))
                .ok_or_else(|| {
                    ApiError::BadRequest(format!(
                        "{} must be an RFC 3339 timestamp",
                        STORAGE_TOKEN_EXPIRES_HEADER
                    ))
                })?;
            Ok(token.with_expiry(expires_at))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_content_disposition_escapes_quotes() {
        assert_eq!(
            content_disposition("a.wav"),
            "attachment; filename=\"a.wav\""
        );
        assert_eq!(
            content_disposition("my \"song\".wav"),
            "attachment; filename=\"my _song_.wav\""
        );
    }

    #[test]
    fn test_access_token_missing() {
        let err = access_token(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_access_token_with_expiry() {
        let mut headers = HeaderMap::new();
        headers.insert(STORAGE_TOKEN_HEADER, HeaderValue::from_static("jwt"));
        headers.insert(
            STORAGE_TOKEN_EXPIRES_HEADER,
            HeaderValue::from_static("2000-01-01T00:00:00Z"),
        );

        let token = access_token(&headers).unwrap();
        assert_eq!(token.value(), "jwt");
        assert!(token.is_expired());
    }

    #[test]
    fn test_access_token_bad_expiry() {
        let mut headers = HeaderMap::new();
        headers.insert(STORAGE_TOKEN_HEADER, HeaderValue::from_static("jwt"));
        headers.insert(
            STORAGE_TOKEN_EXPIRES_HEADER,
            HeaderValue::from_static("tomorrow"),
        );

        let err = access_token(&headers).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use convertino_core::{
    format::normalize_extension, category_of, compatible_targets, MediaCategory, PoolStatus,
    SanitizedConfig,
};

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// Conversion options for one extension
#[derive(Debug, Serialize)]
pub struct FormatResponse {
    pub extension: String,
    pub category: MediaCategory,
    /// Empty when the extension is unknown; not an error.
    pub compatible_targets: Vec<String>,
}

/// GET /api/v1/formats/{ext}
pub async fn get_format(Path(extension): Path<String>) -> Json<FormatResponse> {
    Json(FormatResponse {
        extension: normalize_extension(&extension),
        category: category_of(&extension),
        compatible_targets: compatible_targets(&extension),
    })
}

/// GET /api/v1/pool
pub async fn get_pool(State(state): State<Arc<AppState>>) -> Json<PoolStatus> {
    Json(state.engine().pool_status())
}

/// GET /metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state).await;
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

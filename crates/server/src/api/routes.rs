use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::middleware::{auth_middleware, metrics_middleware};
use super::{artifacts, conversions, handlers};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let max_body = state.config().server.max_upload_bytes;

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Format registry
        .route("/formats/{ext}", get(handlers::get_format))
        // Worker pool
        .route("/pool", get(handlers::get_pool))
        // Conversions
        .route(
            "/conversions",
            get(conversions::list_conversions).post(conversions::create_conversion),
        )
        .route("/conversions/upload", post(conversions::upload_conversion))
        .route(
            "/conversions/{batch_id}",
            get(conversions::get_conversion).delete(conversions::cancel_conversion),
        )
        .route("/conversions/{batch_id}/wait", get(conversions::wait_conversion))
        .route(
            "/conversions/{batch_id}/record",
            delete(conversions::forget_conversion),
        )
        .route("/jobs/{job_id}", get(conversions::get_job))
        // Artifacts
        .route(
            "/artifacts/{job_id}",
            get(artifacts::download_artifact).delete(artifacts::delete_artifact),
        )
        .route("/artifacts/{job_id}/cloud", post(artifacts::upload_to_cloud))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state.clone());

    // Prometheus scrape endpoint stays outside auth
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .merge(metrics_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

//! Authentication and metrics exposure through the full router.

mod common;

use axum::http::StatusCode;

use common::{TestConfig, TestFixture};
use convertino_core::AuthConfig;

async fn api_key_fixture() -> TestFixture {
    TestFixture::with_config(TestConfig::default().with_auth(AuthConfig::api_key("s3cret"))).await
}

#[tokio::test]
async fn test_api_requires_key() {
    let fixture = api_key_fixture().await;

    let response = fixture.get("/api/v1/health").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = fixture.upload("mp3", "wav", &[("a.mp3", b"a")]).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(fixture.transcoder.recorded_transcodes().await.is_empty());
}

#[tokio::test]
async fn test_api_accepts_bearer_key() {
    let fixture = api_key_fixture().await;
    let response = fixture
        .get_with_headers("/api/v1/health", &[("Authorization", "Bearer s3cret")])
        .await;
    assert_status!(response, StatusCode::OK);
}

#[tokio::test]
async fn test_api_accepts_x_api_key() {
    let fixture = api_key_fixture().await;
    let response = fixture
        .get_with_headers("/api/v1/config", &[("X-API-Key", "s3cret")])
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["auth"]["method"], "api_key");
    assert_eq!(response.body["auth"]["api_key_configured"], true);
    assert!(!response.body.to_string().contains("s3cret"));
}

#[tokio::test]
async fn test_api_rejects_wrong_key() {
    let fixture = api_key_fixture().await;
    let response = fixture
        .get_with_headers("/api/v1/pool", &[("Authorization", "Bearer nope")])
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_metrics_endpoint_is_public() {
    let fixture = api_key_fixture().await;

    // Generate at least one labelled sample
    fixture.get("/api/v1/health").await;

    let response = fixture.get_raw("/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
    let text = String::from_utf8(response.body).unwrap();
    assert!(text.contains("convertino_http_requests_total"));
    assert!(text.contains("convertino_pool_active_jobs"));
    assert!(text.contains("convertino_auth_failures_total"));
}

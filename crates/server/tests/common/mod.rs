//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock dependencies injected, enabling end-to-end API tests without
//! ffmpeg or a storage backend.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use convertino_core::{
    testing::{MockCloudUploader, MockTranscoder},
    AuthConfig, CloudUploader, Config, ConversionEngine, EngineConfig, ResultStore, SourceRoot,
    StoreConfig, TranscoderSet,
};
use convertino_server::state::AppState;

/// Re-export fixtures for test convenience
pub use convertino_core::testing::fixtures;

const BOUNDARY: &str = "convertino-test-boundary";

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_upload() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture
///         .upload("mp3", "wav", &[("a.mp3", b"aaa")])
///         .await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Engine behind the router, for direct inspection
    pub engine: ConversionEngine,
    /// Mock transcoder - echoes input bytes unless told otherwise
    pub transcoder: Arc<MockTranscoder>,
    /// Mock cloud uploader - records uploads
    pub cloud: Arc<MockCloudUploader>,
    /// Source root for server-local files
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Response whose body is kept as raw bytes
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let transcoder = Arc::new(test_config.transcoder.unwrap_or_default());
        let cloud = Arc::new(MockCloudUploader::new());

        let mut config = Config::with_auth(test_config.auth);
        config.engine = EngineConfig::default()
            .with_max_concurrent_jobs(test_config.max_concurrent_jobs);
        config.store = StoreConfig::default().with_ttl(test_config.ttl_secs);

        let store = Arc::new(ResultStore::new(config.store.clone()));
        let engine = ConversionEngine::new(
            config.engine.clone(),
            TranscoderSet::new().with(Arc::clone(&transcoder) as _),
            store,
        );

        let authenticator = Arc::from(
            convertino_core::create_authenticator(&config.auth)
                .expect("Failed to create authenticator"),
        );

        let cloud_uploader = test_config
            .enable_cloud
            .then(|| Arc::clone(&cloud) as Arc<dyn CloudUploader>);

        let mut state = AppState::new(config, authenticator, engine.clone(), cloud_uploader);
        if test_config.local_sources {
            let root = SourceRoot::new(temp_dir.path()).expect("Failed to resolve source root");
            state = state.with_source_root(root);
        }
        let state = Arc::new(state);

        let router = convertino_server::api::create_router(state);

        Self {
            router,
            engine,
            transcoder,
            cloud,
            temp_dir,
        }
    }

    /// Write a file into the fixture's temp dir and return its path.
    pub fn write_file(&self, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, contents).expect("Failed to write source file");
        path
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, &[]).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body), &[]).await
    }

    /// Send a POST request with JSON body and extra headers.
    pub async fn post_with_headers(
        &self,
        path: &str,
        body: Value,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        self.request("POST", path, Some(body), headers).await
    }

    /// Send a GET request with extra headers.
    pub async fn get_with_headers(&self, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        self.request("GET", path, None, headers).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None, &[]).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        Self::into_test_response(self.send(request).await).await
    }

    /// Submit an upload batch through `POST /api/v1/conversions/upload`.
    pub async fn upload(&self, source: &str, target: &str, files: &[(&str, &[u8])]) -> TestResponse {
        let fields = [("source_format", source), ("target_format", target)];
        self.multipart("/api/v1/conversions/upload", &fields, files)
            .await
    }

    /// Send a multipart POST with text fields and `files` parts.
    pub async fn multipart(
        &self,
        path: &str,
        fields: &[(&str, &str)],
        files: &[(&str, &[u8])],
    ) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(fields, files)))
            .unwrap();
        Self::into_test_response(self.send(request).await).await
    }

    /// Send a GET and keep the raw body (for artifact downloads).
    pub async fn get_raw(&self, path: &str) -> RawResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = self.send(request).await;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        RawResponse {
            status,
            headers,
            body,
        }
    }

    /// Upload a batch and wait for it to finish. Returns `(batch_id, outcomes)`.
    pub async fn convert(
        &self,
        source: &str,
        target: &str,
        files: &[(&str, &[u8])],
    ) -> (String, Value) {
        let response = self.upload(source, target, files).await;
        assert_eq!(response.status, StatusCode::ACCEPTED, "{}", response.body);
        let batch_id = response.body["batch_id"].as_str().unwrap().to_string();

        let wait = self
            .get(&format!(
                "/api/v1/conversions/{}/wait?timeout_ms=5000",
                batch_id
            ))
            .await;
        assert_eq!(wait.status, StatusCode::OK, "{}", wait.body);
        assert_eq!(wait.body["finished"], true, "{}", wait.body);

        (batch_id, wait.body["outcomes"].clone())
    }

    async fn send(&self, request: Request<Body>) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// Send a request to the test server.
    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            request_builder = request_builder.header(*name, *value);
        }

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        Self::into_test_response(self.send(request).await).await
    }

    async fn into_test_response(response: axum::response::Response) -> TestResponse {
        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    for (file_name, contents) in files {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\n",
                file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(contents);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Configuration for test fixture.
#[derive(Debug)]
pub struct TestConfig {
    pub auth: AuthConfig,
    /// Transcoder to install; a plain echoing mock when `None`
    pub transcoder: Option<MockTranscoder>,
    /// Expose the mock cloud uploader through the API
    pub enable_cloud: bool,
    pub max_concurrent_jobs: usize,
    pub ttl_secs: u64,
    /// Accept server-local paths under the fixture's temp dir
    pub local_sources: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            auth: AuthConfig::none(),
            transcoder: None,
            enable_cloud: true,
            max_concurrent_jobs: 4,
            ttl_secs: 1800,
            local_sources: true,
        }
    }
}

impl TestConfig {
    pub fn with_transcoder(mut self, transcoder: MockTranscoder) -> Self {
        self.transcoder = Some(transcoder);
        self
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    pub fn without_cloud(mut self) -> Self {
        self.enable_cloud = false;
        self
    }

    pub fn with_max_concurrent_jobs(mut self, max: usize) -> Self {
        self.max_concurrent_jobs = max;
        self
    }

    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn without_local_sources(mut self) -> Self {
        self.local_sources = false;
        self
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

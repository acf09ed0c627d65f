//! Common test utilities for E2E testing.
//!
//! This module provides a test fixture that creates an in-process server
//! backed by a real orchestrator, enabling E2E testing without binding a
//! socket.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use sieve_core::{Config, PipelineConfig, ServerConfig, UploadConfig};
use sieve_server::AppState;

/// Re-export fixtures for test convenience
pub use sieve_core::testing::fixtures;

const BOUNDARY: &str = "sieve-test-boundary";

/// Test fixture for E2E testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_upload() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.upload("data.csv", fixtures::DUPLICATE_WITH_GAPS).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Shared state, for reaching the orchestrator and hub directly
    pub state: Arc<AppState>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture with default settings.
    pub fn new() -> Self {
        Self::with_config(TestConfig::default())
    }

    /// Create a test fixture with custom configuration.
    pub fn with_config(test_config: TestConfig) -> Self {
        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            upload: UploadConfig {
                max_file_size_bytes: test_config.max_file_size_bytes,
                ..Default::default()
            },
            pipeline: PipelineConfig {
                checkpoint_delay_ms: test_config.checkpoint_delay_ms,
            },
            ..Default::default()
        };

        let state = Arc::new(AppState::from_config(config));
        let router = sieve_server::create_router(Arc::clone(&state));

        Self { router, state }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, Body::empty()).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None, Body::empty()).await
    }

    /// Upload `content` as a multipart `file` field named `filename`.
    pub async fn upload(&self, filename: &str, content: &str) -> TestResponse {
        self.request_multipart_field("file", filename, content).await
    }

    /// Send a multipart upload with a single field.
    pub async fn request_multipart_field(
        &self,
        field: &str,
        filename: &str,
        content: &str,
    ) -> TestResponse {
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{n}\"; filename=\"{f}\"\r\n\
             Content-Type: text/csv\r\n\r\n{c}\r\n--{b}--\r\n",
            b = BOUNDARY,
            n = field,
            f = filename,
            c = content
        );
        let content_type = format!("multipart/form-data; boundary={}", BOUNDARY);
        self.request("POST", "/api/v1/upload", Some(&content_type), Body::from(body))
            .await
    }

    /// Upload and return the new task id, asserting success.
    pub async fn start_task(&self, content: &str) -> String {
        let response = self.upload("data.csv", content).await;
        assert_eq!(response.status, StatusCode::OK, "upload failed: {:?}", response.body);
        response.body["task_id"]
            .as_str()
            .expect("missing task_id")
            .to_string()
    }

    /// Poll the result endpoint until the task has finished.
    pub async fn wait_for_result(&self, task_id: &str, timeout: Duration) -> Option<Value> {
        let start = std::time::Instant::now();
        let path = format!("/api/v1/tasks/{}/result", task_id);
        while start.elapsed() < timeout {
            let response = self.get(&path).await;
            if response.status == StatusCode::OK {
                return Some(response.body);
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        None
    }

    /// Send a request to the test server.
    async fn request(
        &self,
        method: &str,
        path: &str,
        content_type: Option<&str>,
        body: Body,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);
        if let Some(content_type) = content_type {
            request_builder = request_builder.header("Content-Type", content_type);
        }
        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Pause at every pipeline checkpoint
    pub checkpoint_delay_ms: u64,
    /// Upload size limit
    pub max_file_size_bytes: usize,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            checkpoint_delay_ms: 0,
            max_file_size_bytes: UploadConfig::default().max_file_size_bytes,
        }
    }
}

impl TestConfig {
    /// Create config with slow checkpoints, for cancellation tests.
    pub fn slow() -> Self {
        Self {
            checkpoint_delay_ms: 200,
            ..Default::default()
        }
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

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}

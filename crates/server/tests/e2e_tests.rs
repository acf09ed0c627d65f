//! End-to-end tests of the HTTP surface.
//!
//! These tests run the full server stack in-process with a real orchestrator
//! and hub; uploads go through the same cleaning pipeline as in production.

#[macro_use]
mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use common::{fixtures, TestConfig, TestFixture};

// =============================================================================
// Basic API Tests
// =============================================================================

#[tokio::test]
async fn test_root_endpoint() {
    let fixture = TestFixture::new();
    let response = fixture.get("/").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["name"], "sieve");
    assert!(response.body["version"].is_string());
}

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/health").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["active_tasks"], 0);
    assert_eq!(response.body["active_connections"], 0);
    assert!(response.body["timestamp"].is_string());
}

#[tokio::test]
async fn test_config_endpoint() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/config").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body["hub"], "queue_capacity", json!(100));
    assert_json_path!(response.body["hub"], "overflow_retain", json!(50));
    assert_json_path!(response.body["upload"], "allowed_extensions", json!(["csv"]));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/metrics").await;
    assert_status!(response, StatusCode::OK);
    assert!(response.text.contains("sieve_http_requests_total"));
    assert!(response.text.contains("sieve_tasks_active"));
}

// =============================================================================
// Upload Tests
// =============================================================================

#[tokio::test]
async fn test_upload_drops_empty_column_and_duplicates() {
    let fixture = TestFixture::new();

    let response = fixture.upload("people.csv", fixtures::DUPLICATE_WITH_GAPS).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["message"], "Processing started");
    assert_eq!(response.body["filename"], "people.csv");
    assert_eq!(response.body["file_size"], fixtures::DUPLICATE_WITH_GAPS.len());

    let task_id = response.body["task_id"].as_str().unwrap().to_string();
    assert_eq!(task_id.len(), 36);

    let result = fixture
        .wait_for_result(&task_id, Duration::from_secs(5))
        .await
        .expect("task did not finish");
    assert_eq!(result["success"], true);
    assert_eq!(result["state"], "succeeded");
    assert_eq!(result["original_rows"], 3);
    assert_eq!(result["cleaned_rows"], 2);
    assert_eq!(result["columns"], json!(["a", "b"]));
    assert_eq!(result["summary"], "Processed [3x3] > 2 rows, 2 columns");

    let data = fixture
        .get(&format!("/api/v1/tasks/{}/data", task_id))
        .await;
    assert_status!(data, StatusCode::OK);
    assert_eq!(data.body["shape"], json!([2, 2]));
    assert_eq!(data.body["columns"][0]["name"], "a");
    assert_eq!(data.body["columns"][0]["type"], "int64");
    assert_eq!(data.body["columns"][1]["sample_values"], json!([5, 5]));
    assert_eq!(data.body["processing_result"]["success"], true);
}

#[tokio::test]
async fn test_upload_uppercase_extension_accepted() {
    let fixture = TestFixture::new();
    let response = fixture.upload("REPORT.CSV", fixtures::MIXED).await;
    assert_status!(response, StatusCode::OK);
}

#[tokio::test]
async fn test_upload_rejects_wrong_extension() {
    let fixture = TestFixture::new();
    let response = fixture.upload("data.xlsx", fixtures::DUPLICATE_WITH_GAPS).await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Only CSV files are supported");
}

#[tokio::test]
async fn test_upload_rejects_empty_file() {
    let fixture = TestFixture::new();
    let response = fixture.upload("data.csv", "").await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "File is empty");
}

#[tokio::test]
async fn test_upload_rejects_large_file() {
    let fixture = TestFixture::with_config(TestConfig {
        max_file_size_bytes: 16,
        ..Default::default()
    });
    let response = fixture.upload("data.csv", &fixtures::wide_table(10)).await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "File too large");
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let fixture = TestFixture::new();
    let response = fixture
        .request_multipart_field("other", "data.csv", fixtures::DUPLICATE_WITH_GAPS)
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_header_only_upload_fails_processing() {
    let fixture = TestFixture::new();
    let task_id = fixture.start_task(fixtures::HEADER_ONLY).await;

    let result = fixture
        .wait_for_result(&task_id, Duration::from_secs(5))
        .await
        .expect("task did not finish");
    assert_eq!(result["success"], false);
    assert_eq!(result["state"], "failed");
    assert!(result["summary"]
        .as_str()
        .unwrap()
        .contains("CSV file is empty"));

    let data = fixture
        .get(&format!("/api/v1/tasks/{}/data", task_id))
        .await;
    assert_status!(data, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Task Tests
// =============================================================================

#[tokio::test]
async fn test_unknown_task_lookups() {
    let fixture = TestFixture::new();

    let result = fixture.get("/api/v1/tasks/nope/result").await;
    assert_status!(result, StatusCode::NOT_FOUND);

    let data = fixture.get("/api/v1/tasks/nope/data").await;
    assert_status!(data, StatusCode::NOT_FOUND);

    let cancel = fixture.delete("/api/v1/tasks/nope").await;
    assert_status!(cancel, StatusCode::NOT_FOUND);
    assert!(cancel.body["error"].is_string());
}

#[tokio::test]
async fn test_cancel_running_task() {
    let fixture = TestFixture::with_config(TestConfig::slow());
    let task_id = fixture.start_task(fixtures::DUPLICATE_WITH_GAPS).await;

    let tasks = fixture.get("/api/v1/tasks").await;
    assert_eq!(tasks.body["active_tasks"], json!([task_id.clone()]));

    let cancel = fixture.delete(&format!("/api/v1/tasks/{}", task_id)).await;
    assert_status!(cancel, StatusCode::OK);
    assert_eq!(cancel.body["task_id"], task_id.as_str());

    let again = fixture.delete(&format!("/api/v1/tasks/{}", task_id)).await;
    assert_status!(again, StatusCode::NOT_FOUND);

    let tasks = fixture.get("/api/v1/tasks").await;
    assert_eq!(tasks.body["active_tasks"], json!([]));

    let result = fixture
        .wait_for_result(&task_id, Duration::from_secs(5))
        .await
        .expect("task did not finish");
    assert_eq!(result["state"], "cancelled");
    assert_eq!(result["success"], false);
}

#[tokio::test]
async fn test_debug_endpoint() {
    let fixture = TestFixture::new();
    let task_id = fixture.start_task(fixtures::DUPLICATE_WITH_GAPS).await;
    fixture
        .wait_for_result(&task_id, Duration::from_secs(5))
        .await
        .expect("task did not finish");
    tokio::time::sleep(Duration::from_millis(50)).await;

    let response = fixture
        .get(&format!("/api/v1/tasks/{}/debug", task_id))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["active"], false);
    assert_eq!(response.body["has_result"], true);
    assert_eq!(response.body["has_data"], true);
    assert_eq!(response.body["subscribed"], false);
    assert!(response.body["queued_events"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_ws_requires_upgrade() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/ws/some-task").await;
    assert!(response.status.is_client_error());
}

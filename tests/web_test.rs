//! Integration test for the HTTP boundary
//!
//! Drives the router directly with `tower::ServiceExt::oneshot`; no socket is
//! bound. Prompt presence and length checks run before any pipeline work, so
//! the stubs here only need to satisfy the pipeline constructor.
//!
//! Run with: cargo test --test web_test

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use querysmith::db::QueryExecutor;
use querysmith::llm::{AuditLog, CompletionAttempt, CompletionBackend, CompletionStreamer};
use querysmith::schema::SchemaLocator;
use querysmith::web::router;
use querysmith::{PipelineResult, QueryPipeline, ResultRow};

/// Backend for requests that are rejected before generation starts
struct UnreachableBackend;

#[async_trait]
impl CompletionBackend for UnreachableBackend {
    async fn begin(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
    ) -> Result<Box<dyn CompletionAttempt>> {
        bail!("completion backend should not be reached")
    }
}

/// Executor with an empty catalog, so any run that starts fails at matching
struct EmptyCatalogExecutor;

#[async_trait]
impl QueryExecutor for EmptyCatalogExecutor {
    async fn query(&self, _sql: &str) -> PipelineResult<Option<Vec<ResultRow>>> {
        Ok(Some(Vec::new()))
    }
}

fn test_app() -> axum::Router {
    let executor = Arc::new(EmptyCatalogExecutor);
    let streamer = CompletionStreamer::new(Arc::new(UnreachableBackend))
        .with_retry_policy(1, Duration::from_millis(1));
    let pipeline = QueryPipeline::new(
        SchemaLocator::new(executor.clone(), "public"),
        streamer,
        executor,
        Arc::new(AuditLog::default()),
    );
    router(Arc::new(pipeline))
}

fn table_builder_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/table-builder")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_missing_or_blank_prompt_is_rejected_with_400() {
    for body in ["{}", r#"{"prompt":""}"#, r#"{"prompt":"   "}"#] {
        let response = test_app()
            .oneshot(table_builder_request(body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["message"], "Prompt parameter is required");
    }
}

#[tokio::test]
async fn test_overlong_prompt_is_rejected_with_413() {
    let body = json!({ "prompt": "a".repeat(2001) }).to_string();
    let response = test_app()
        .oneshot(table_builder_request(&body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Prompt is too long");
}

#[tokio::test]
async fn test_prompt_at_the_length_limit_is_accepted() {
    let body = json!({ "prompt": "a".repeat(2000) }).to_string();
    let response = test_app()
        .oneshot(table_builder_request(&body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("text/event-stream"));
}

#[tokio::test]
async fn test_failed_run_streams_a_single_error_event() {
    let response = test_app()
        .oneshot(table_builder_request(r#"{"prompt":"orders"}"#))
        .await
        .unwrap();

    // Rejections are HTTP errors; a run that starts always answers 200 and
    // reports failure inside the stream
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(body.contains("event: status"));
    assert_eq!(body.matches("event: error").count(), 1);
    assert!(body.contains("No matching tables found for prompt"));
    assert!(!body.contains("event: complete"));
}

#[tokio::test]
async fn test_health_endpoint_reports_ok() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

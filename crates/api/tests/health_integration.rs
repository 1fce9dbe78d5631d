//! Health and metrics endpoint integration tests.
//!
//! Run with: cargo test --test health_integration

mod common;

use axum::http::{Method, StatusCode};
use common::{get_request, json_request_with_auth, parse_response_body, TestApp, ADMIN};
use invite_api::middleware::init_metrics;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_liveness() {
    let app = TestApp::new();

    let response = app.router.clone().oneshot(get_request("/api/health/live")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "alive");
}

#[tokio::test]
async fn test_readiness_with_memory_store() {
    let app = TestApp::new();

    let response = app.router.clone().oneshot(get_request("/api/health/ready")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_health_reports_memory_backend() {
    let app = TestApp::new();

    let response = app.router.clone().oneshot(get_request("/api/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["storage"]["backend"], "memory");
    assert_eq!(body["storage"]["connected"], true);
    assert!(body["storage"].get("latency_ms").is_none());
}

#[tokio::test]
async fn test_metrics_after_invitation() {
    init_metrics().expect("Failed to install metrics recorder");
    let app = TestApp::new();

    let token = app.token_for(ADMIN);
    let response = app
        .router
        .clone()
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/v1/invites",
            json!({ "username": "bob", "email": "bob@example.com" }),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.router.clone().oneshot(get_request("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("invitations_total"));
    assert!(text.contains("http_requests_total"));
}

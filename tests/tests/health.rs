//! Tests for health check endpoints.

use axum::http::StatusCode;
use gateway_core::keys::SESSION_PREFIX;
use integration_tests::setup::TestContext;
use keyed_store::KeyedStore;

/// Test /health endpoint returns proper structure
#[tokio::test]
async fn test_health_endpoint_structure() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["redis_connected"], true);
    assert_eq!(body["pending_replies"], 0);
}

/// Test /health reports an unreachable store as 503
#[tokio::test]
async fn test_health_endpoint_store_down() {
    let ctx = TestContext::new();
    let server = ctx.server();
    ctx.set_store_failure(true);

    let response = server.get("/health").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["redis_connected"], false);
}

/// Probes never run the session middleware, even with a bad token
#[tokio::test]
async fn test_health_bypasses_sessions() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .get("/health/live")
        .add_header("X-Session-Token", "not-a-session")
        .await;

    response.assert_status_ok();
    assert!(response.headers().get("x-session-token").is_none());
    assert!(ctx.store.scan_prefix(SESSION_PREFIX).await.unwrap().is_empty());
}

/// Test /health/ready endpoint
#[tokio::test]
async fn test_ready_endpoint() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server.get("/health/ready").await;

    // Depends on the process-wide registry other tests also update
    let status = response.status_code();
    assert!(
        status == StatusCode::OK || status == StatusCode::SERVICE_UNAVAILABLE,
        "Ready endpoint should return 200 or 503, got {}",
        status
    );
}

//! End-to-end tests for the chat endpoints.
//!
//! A scripted worker stands in for the reply publisher on an in-memory store.

use axum::http::StatusCode;
use gateway_core::keys::{request_key, response_key, INBOUND_QUEUE};
use integration_tests::{
    fixtures::{self, chat_request, echo_of, request_id},
    mocks::ReplyMode,
    setup::TestContext,
};
use keyed_store::KeyedStore;
use std::future::IntoFuture;

/// Reply over the shared outbound queue reaches the caller
#[tokio::test]
async fn test_chat_reply_via_outbound_queue() {
    let ctx = TestContext::new();
    let worker = ctx.worker(ReplyMode::OutboundQueue);
    let server = ctx.server();

    let id = request_id();
    let response = server.post("/chat").json(&chat_request(&id, "hi")).await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["id"], id);
    assert_eq!(body["userMessage"], "hi");
    assert_eq!(body["response"], echo_of("hi"));
    assert!(body.get("timestamp").is_some());
    assert!(body.get("sessionToken").is_none());

    // The worker saw the request under the session issued for it
    let token = response
        .headers()
        .get("x-session-token")
        .and_then(|h| h.to_str().ok())
        .expect("new session token should be echoed")
        .to_string();
    let seen = worker.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].id, id);
    assert_eq!(seen[0].session_token.as_deref(), Some(token.as_str()));
}

/// Reply written to the per-request key reaches the caller
#[tokio::test]
async fn test_chat_reply_via_direct_key() {
    let ctx = TestContext::new();
    let _worker = ctx.worker(ReplyMode::DirectKey);
    let server = ctx.server();

    let response = server
        .post("/chat")
        .json(&fixtures::new_chat_request("hello there"))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["response"], echo_of("hello there"));
}

/// Concurrent callers each get their own reply from the shared queue
#[tokio::test]
async fn test_concurrent_chats_get_their_own_replies() {
    let ctx = TestContext::new();
    let _worker = ctx.worker(ReplyMode::OutboundQueue);
    let server = ctx.server();

    let (a, b, c) = tokio::join!(
        server
            .post("/chat")
            .json(&chat_request("a", "first"))
            .into_future(),
        server
            .post("/chat")
            .json(&chat_request("b", "second"))
            .into_future(),
        server
            .post("/chat")
            .json(&chat_request("c", "third"))
            .into_future(),
    );

    for (response, id, message) in [(a, "a", "first"), (b, "b", "second"), (c, "c", "third")] {
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["id"], id);
        assert_eq!(body["response"], echo_of(message));
    }
}

/// No reply before the deadline returns CHAT_001, and the request stays readable
#[tokio::test]
async fn test_chat_timeout_returns_408() {
    let ctx = TestContext::new();
    let _worker = ctx.worker(ReplyMode::Silent);
    let server = ctx.server();

    let id = request_id();
    let response = server.post("/chat").json(&chat_request(&id, "anyone?")).await;

    response.assert_status(StatusCode::REQUEST_TIMEOUT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "CHAT_001");

    let token = ctx.session_token().await;
    let fetched = server
        .get(&format!("/chat/{}", id))
        .add_header("X-Session-Token", token)
        .await;
    fetched.assert_status_ok();
    let record: serde_json::Value = fetched.json();
    assert_eq!(record["userMessage"], "anyone?");
    assert!(record.get("response").is_none());
}

/// A reply sent by the client is dropped; only the worker answers
#[tokio::test]
async fn test_client_supplied_response_is_ignored() {
    let ctx = TestContext::new();
    let _worker = ctx.worker(ReplyMode::Silent);
    let server = ctx.server();

    let id = request_id();
    let mut body = chat_request(&id, "anyone?");
    body["response"] = serde_json::json!("forged");
    let response = server.post("/chat").json(&body).await;
    response.assert_status(StatusCode::REQUEST_TIMEOUT);

    let token = ctx.session_token().await;
    let fetched = server
        .get(&format!("/chat/{}", id))
        .add_header("X-Session-Token", token)
        .await;
    fetched.assert_status_ok();
    let record: serde_json::Value = fetched.json();
    assert!(record.get("response").is_none());
}

/// A direct reply is consumed, so the key is gone once the caller has it
#[tokio::test]
async fn test_direct_reply_key_is_consumed() {
    let ctx = TestContext::new();
    let _worker = ctx.worker(ReplyMode::DirectKey);
    let server = ctx.server();

    let id = request_id();
    let response = server.post("/chat").json(&chat_request(&id, "once")).await;

    response.assert_status_ok();
    assert!(ctx.store.get(&response_key(&id)).await.unwrap().is_none());
}

/// Worker error replies surface as CHAT_002
#[tokio::test]
async fn test_worker_error_returns_502() {
    let ctx = TestContext::new();
    let _worker = ctx.worker(ReplyMode::Fail("model unavailable".into()));
    let server = ctx.server();

    let response = server
        .post("/chat")
        .json(&fixtures::new_chat_request("hi"))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "CHAT_002");
    assert!(body["error"].as_str().unwrap().contains("model unavailable"));
}

/// Missing fields are rejected before anything is recorded or enqueued
#[tokio::test]
async fn test_invalid_chat_returns_400() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let missing_message = server
        .post("/chat")
        .json(&serde_json::json!({ "id": "r9" }))
        .await;
    missing_message.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = missing_message.json();
    assert_eq!(body["code"], "VALID_001");
    assert_eq!(body["error"], "User message is required");

    let missing_id = server
        .post("/chat")
        .json(&serde_json::json!({ "id": "", "userMessage": "hi" }))
        .await;
    missing_id.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = missing_id.json();
    assert_eq!(body["error"], "Message ID is required");

    let not_json = server
        .post("/chat")
        .content_type("application/json")
        .text("{not json")
        .await;
    not_json.assert_status(StatusCode::BAD_REQUEST);

    assert_eq!(ctx.store.queue_len(INBOUND_QUEUE), 0);
    assert!(ctx.store.get(&request_key("r9")).await.unwrap().is_none());
}

/// Unknown ids return CHAT_004
#[tokio::test]
async fn test_fetch_unknown_chat_returns_404() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server.get("/chat/does-not-exist").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "CHAT_004");
}

/// Store outage surfaces as STORE_001 without leaking details
#[tokio::test]
async fn test_store_outage_returns_503() {
    let ctx = TestContext::new();
    let server = ctx.server();
    ctx.set_store_failure(true);

    let response = server
        .post("/chat")
        .json(&fixtures::new_chat_request("hi"))
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "STORE_001");
}

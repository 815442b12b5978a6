//! Chat endpoints.
//!
//! `POST /chat` blocks until the worker answers or the response deadline
//! passes; `GET /chat/{id}` reads back what was submitted.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use gateway_core::{ChatMessage, Error};
use telemetry::metrics;
use tracing::debug;

use crate::extractors::SessionToken;
use crate::response::{ApiError, ChatResponse};
use crate::state::AppState;

/// POST /chat - Submit a message and wait for its reply.
pub async fn submit_handler(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    body: Bytes,
) -> Result<Json<ChatResponse>, ApiError> {
    let message: ChatMessage = serde_json::from_slice(&body).map_err(|e| {
        metrics().chats_rejected.inc();
        debug!("Failed to parse chat request: {}", e);
        ApiError::bad_request(format!("Invalid chat request: {}", e))
    })?;

    let answered = state
        .gateway
        .submit(message.with_session_token(token))
        .await?;

    Ok(Json(answered.into()))
}

/// GET /chat/{id} - Read back a submitted request.
pub async fn fetch_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChatResponse>, ApiError> {
    let record = state
        .gateway
        .fetch(&id)
        .await?
        .ok_or_else(|| Error::not_found(format!("chat request {}", id)))?;

    Ok(Json(record.into()))
}

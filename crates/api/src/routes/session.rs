//! Session endpoints for the current request's session.

use axum::{body::Bytes, extract::State, Json};
use gateway_core::Session;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::extractors::SessionToken;
use crate::response::{ApiError, SessionDeleted};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSessionRequest {
    #[serde(default)]
    pub metadata: Option<HashMap<String, Value>>,
}

/// GET /session
pub async fn get_handler(
    State(state): State<AppState>,
    token: SessionToken,
) -> Result<Json<Session>, ApiError> {
    state
        .sessions
        .get(token.as_str())
        .await?
        .map(Json)
        .ok_or_else(ApiError::session_not_found)
}

/// PATCH /session - Merge metadata into the session. An empty body only
/// refreshes its activity.
pub async fn update_handler(
    State(state): State<AppState>,
    token: SessionToken,
    body: Bytes,
) -> Result<Json<Session>, ApiError> {
    let request: UpdateSessionRequest = if body.is_empty() {
        UpdateSessionRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::bad_request(format!("Invalid session update: {}", e)))?
    };

    state
        .sessions
        .update(token.as_str(), request.metadata)
        .await?
        .map(Json)
        .ok_or_else(ApiError::session_not_found)
}

/// DELETE /session
pub async fn delete_handler(
    State(state): State<AppState>,
    token: SessionToken,
) -> Result<Json<SessionDeleted>, ApiError> {
    let deleted = state.sessions.delete(token.as_str()).await?;
    Ok(Json(SessionDeleted { deleted }))
}

//! Standardized API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use gateway_core::ChatMessage;
use serde::{Deserialize, Serialize};

/// Chat exchange as returned to clients. Never exposes the session token.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub id: String,
    pub user_message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl From<ChatMessage> for ChatResponse {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id,
            user_message: message.user_message,
            timestamp: message.timestamp,
            response: message.response,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub redis_connected: bool,
    pub pending_replies: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionDeleted {
    pub deleted: bool,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// API error type with coded bodies.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ErrorResponse,
}

impl ApiError {
    pub fn with_code(status: StatusCode, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            response: ErrorResponse::new(msg, code),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_REQUEST, "VALID_001", msg)
    }

    pub fn invalid_session() -> Self {
        Self::with_code(
            StatusCode::UNAUTHORIZED,
            "SESSION_001",
            "Invalid or expired session",
        )
    }

    pub fn session_not_found() -> Self {
        Self::with_code(StatusCode::NOT_FOUND, "SESSION_002", "Session not found")
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_001", msg)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<gateway_core::Error> for ApiError {
    fn from(err: gateway_core::Error) -> Self {
        let status = StatusCode::from_u16(err.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match &err {
            gateway_core::Error::Validation(msg) => ApiError::bad_request(msg),
            gateway_core::Error::InvalidSession => ApiError::invalid_session(),
            // Don't leak store internals to clients
            gateway_core::Error::Store(_) => {
                ApiError::with_code(status, err.code(), "Service temporarily unavailable")
            }
            gateway_core::Error::Serialization(_) | gateway_core::Error::Internal(_) => {
                ApiError::internal("Internal server error")
            }
            _ => ApiError::with_code(status, err.code(), err.to_string()),
        }
    }
}

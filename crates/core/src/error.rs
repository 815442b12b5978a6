//! Unified error types for the chat gateway.
//!
//! Error codes:
//! - VALID_001: Validation errors
//! - CHAT_001-004: Correlation outcomes (timeout, worker failure, duplicate, not found)
//! - SESSION_001-002: Session errors
//! - STORE_001: Keyed store unavailable

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the gateway.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller-supplied data rejected before any store access.
    #[error("validation error: {0}")]
    Validation(String),

    /// The keyed store failed or is unreachable. Transient.
    #[error("store error: {0}")]
    Store(String),

    /// No reply arrived before the response deadline.
    #[error("no response for request {id} after {waited_ms}ms")]
    Timeout { id: String, waited_ms: u64 },

    /// The reply publisher reported an error instead of a reply.
    #[error("worker failed to answer request {id}: {message}")]
    WorkerFailed { id: String, message: String },

    /// The same request id is already waiting for a reply in this process.
    #[error("request {0} is already awaiting a reply")]
    DuplicateRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid or expired session")]
    InvalidSession,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the caller may retry the same operation and expect a different result.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Timeout { .. })
    }

    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALID_001",
            Self::Timeout { .. } => "CHAT_001",
            Self::WorkerFailed { .. } => "CHAT_002",
            Self::DuplicateRequest(_) => "CHAT_003",
            Self::NotFound(_) => "CHAT_004",
            Self::InvalidSession => "SESSION_001",
            Self::Store(_) => "STORE_001",
            Self::Serialization(_) | Self::Internal(_) => "INTERNAL_001",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::InvalidSession => 401,
            Self::NotFound(_) => 404,
            Self::Timeout { .. } => 408,
            Self::DuplicateRequest(_) => 409,
            Self::WorkerFailed { .. } => 502,
            Self::Store(_) => 503,
            Self::Serialization(_) | Self::Internal(_) => 500,
        }
    }
}

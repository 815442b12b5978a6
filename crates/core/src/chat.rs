//! Chat request records, queue envelopes, and reply signals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{Error, Result};

/// A chat request as submitted by the client and persisted under `request:{id}`.
///
/// `response` is only ever filled on the value returned to the caller; the
/// persisted record keeps whatever the client submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Caller-generated correlation id
    #[validate(length(min = 1, message = "Message ID is required"))]
    #[serde(default)]
    pub id: String,
    /// User text
    #[validate(length(min = 1, message = "User message is required"))]
    #[serde(default)]
    pub user_message: String,
    /// Submission time, informational only
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Reply text, absent until resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Session the request was made under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

impl ChatMessage {
    pub fn new(id: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_message: user_message.into(),
            timestamp: Utc::now(),
            response: None,
            session_token: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Attaches the resolved reply.
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    /// Checks the submission preconditions: non-empty id and message.
    pub fn check(&self) -> Result<()> {
        // Report the id first, matching the order clients see field errors in.
        if self.id.is_empty() {
            return Err(Error::validation("Message ID is required"));
        }
        self.validate()
            .map_err(|e| Error::validation(format!("{}", e)))
    }

    /// Projection pushed onto the inbound queue.
    pub fn queue_entry(&self) -> QueueEntry {
        QueueEntry {
            id: self.id.clone(),
            user_message: self.user_message.clone(),
            timestamp: self.timestamp,
            session_token: self.session_token.clone(),
        }
    }
}

/// Envelope pushed to the inbound queue. Never carries a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub id: String,
    pub user_message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

/// A reply as published by the worker, on either channel.
///
/// Outbound queue entries carry `id`; direct keys usually don't. Workers
/// write the text as `response`; `reply` is accepted too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplySignal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, alias = "reply", skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReplySignal {
    pub fn reply(id: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            response: Some(response.into()),
            error: None,
        }
    }

    pub fn failure(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            response: None,
            error: Some(error.into()),
        }
    }

    /// Decodes a raw store value. Malformed data yields `None`.
    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    pub fn into_outcome(self) -> ReplyOutcome {
        match (self.response, self.error) {
            (Some(text), _) => ReplyOutcome::Reply(text),
            (None, Some(error)) => ReplyOutcome::Failed(error),
            (None, None) => ReplyOutcome::Failed("no response content".to_string()),
        }
    }
}

/// How a request was resolved by the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    Reply(String),
    Failed(String),
}

impl ReplyOutcome {
    /// Converts into the reply text, or a `WorkerFailed` error for `id`.
    pub fn into_result(self, id: &str) -> Result<String> {
        match self {
            Self::Reply(text) => Ok(text),
            Self::Failed(message) => Err(Error::WorkerFailed {
                id: id.to_string(),
                message,
            }),
        }
    }
}

/// The channel a reply was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyChannel {
    OutboundQueue,
    DirectKey,
}

impl ReplyChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutboundQueue => "outbound_queue",
            Self::DirectKey => "direct_key",
        }
    }
}

impl std::fmt::Display for ReplyChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

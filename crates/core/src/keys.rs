//! Queue names and key naming shared with the reply publisher.
//!
//! These names are the wire contract with the external worker; changing any
//! of them breaks compatibility with deployed workers.

/// Inbound queue the worker drains (`RPUSH` here, `LPOP`/`BLPOP` there).
pub const INBOUND_QUEUE: &str = "emotika_incoming";

/// Shared outbound queue the worker pushes replies onto.
pub const OUTBOUND_QUEUE: &str = "emotika_response";

/// Prefix for persisted request records.
pub const REQUEST_PREFIX: &str = "request:";

/// Prefix for direct reply keys.
pub const RESPONSE_PREFIX: &str = "response:";

/// Prefix for session records.
pub const SESSION_PREFIX: &str = "session:";

/// Key of the persisted request record for `id`.
pub fn request_key(id: &str) -> String {
    format!("{REQUEST_PREFIX}{id}")
}

/// Key of the direct reply for `id`.
pub fn response_key(id: &str) -> String {
    format!("{RESPONSE_PREFIX}{id}")
}

/// Key of the session record for `token`.
pub fn session_key(token: &str) -> String {
    format!("{SESSION_PREFIX}{token}")
}

//! Session handling types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Default sliding session window (30 minutes of inactivity).
pub const SESSION_TIMEOUT_MINUTES: i64 = 30;

/// HTTP header carrying the session token in both directions.
pub const SESSION_HEADER: &str = "X-Session-Token";

/// A client session, persisted under `session:{token}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque correlation handle
    pub token: String,
    /// Last validated access
    pub last_activity: DateTime<Utc>,
    /// Optional owner, informational
    #[serde(default)]
    pub user_id: Option<String>,
    /// Caller-extensible data
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Session {
    /// Creates a new session with a fresh token.
    pub fn new(user_id: Option<String>, metadata: HashMap<String, serde_json::Value>) -> Self {
        Self {
            token: Uuid::new_v4().to_string(),
            last_activity: Utc::now(),
            user_id,
            metadata,
        }
    }

    /// Records activity and merges `patch` into the metadata.
    ///
    /// Keys in `patch` overwrite existing ones; other keys are left untouched.
    pub fn touch(&mut self, patch: Option<HashMap<String, serde_json::Value>>) {
        self.last_activity = Utc::now();
        if let Some(patch) = patch {
            self.metadata.extend(patch);
        }
    }
}

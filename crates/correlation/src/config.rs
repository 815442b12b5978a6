//! Correlation configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing and retention knobs for the correlation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// How long a caller waits for a reply, from submission
    #[serde(default = "default_response_timeout_secs")]
    pub response_timeout_secs: u64,
    /// Direct-key poll and outbound-queue drain interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// TTL applied to persisted request records; `None` keeps them forever
    #[serde(default)]
    pub request_ttl_secs: Option<u64>,
    /// TTL of replies republished to direct keys because no local caller waited
    #[serde(default = "default_orphan_reply_ttl_secs")]
    pub orphan_reply_ttl_secs: u64,
    /// Pause after a failed outbound-queue drain, in milliseconds
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,
}

fn default_response_timeout_secs() -> u64 {
    60
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_orphan_reply_ttl_secs() -> u64 {
    300
}

fn default_error_backoff_ms() -> u64 {
    1000
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            response_timeout_secs: default_response_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            request_ttl_secs: None,
            orphan_reply_ttl_secs: default_orphan_reply_ttl_secs(),
            error_backoff_ms: default_error_backoff_ms(),
        }
    }
}

impl CorrelationConfig {
    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn request_ttl(&self) -> Option<Duration> {
        self.request_ttl_secs
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }

    pub fn orphan_reply_ttl(&self) -> Duration {
        Duration::from_secs(self.orphan_reply_ttl_secs.max(1))
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}

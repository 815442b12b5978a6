//! In-process metrics.
//!
//! Plain atomics, read by the `/health` endpoint and logged on shutdown.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Histogram for reply latency.
#[derive(Debug)]
pub struct Histogram {
    /// Upper bounds in ms; the last bucket also takes everything above it
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [
        10, 50, 100, 250, 500, 1_000, 2_500, 5_000, 10_000, 30_000, 60_000,
    ];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BUCKET_BOUNDS.len() - 1);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum.load(Ordering::Relaxed) as f64 / count as f64
        }
    }

    /// Returns `(upper bound ms, count)` per bucket.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the gateway.
#[derive(Debug, Default)]
pub struct Metrics {
    // Correlation
    pub chats_submitted: Counter,
    pub chats_rejected: Counter,
    pub replies_via_queue: Counter,
    pub replies_via_direct_key: Counter,
    pub chat_timeouts: Counter,
    pub worker_failures: Counter,
    pub orphan_replies: Counter,
    pub malformed_replies: Counter,

    // Sessions
    pub sessions_created: Counter,
    pub sessions_rejected: Counter,

    // Store
    pub store_errors: Counter,

    pub reply_latency_ms: Histogram,

    /// Callers currently waiting on a reply in this process
    pub pending_replies: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub chats_submitted: u64,
    pub chats_rejected: u64,
    pub replies_via_queue: u64,
    pub replies_via_direct_key: u64,
    pub chat_timeouts: u64,
    pub worker_failures: u64,
    pub orphan_replies: u64,
    pub malformed_replies: u64,
    pub sessions_created: u64,
    pub sessions_rejected: u64,
    pub store_errors: u64,
    pub reply_latency_mean_ms: f64,
    pub pending_replies: u64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            chats_submitted: self.chats_submitted.get(),
            chats_rejected: self.chats_rejected.get(),
            replies_via_queue: self.replies_via_queue.get(),
            replies_via_direct_key: self.replies_via_direct_key.get(),
            chat_timeouts: self.chat_timeouts.get(),
            worker_failures: self.worker_failures.get(),
            orphan_replies: self.orphan_replies.get(),
            malformed_replies: self.malformed_replies.get(),
            sessions_created: self.sessions_created.get(),
            sessions_rejected: self.sessions_rejected.get(),
            store_errors: self.store_errors.get(),
            reply_latency_mean_ms: self.reply_latency_ms.mean(),
            pending_replies: self.pending_replies.get(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}

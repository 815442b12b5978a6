//! In-process keyed store.
//!
//! Mirrors the Redis semantics the gateway relies on (TTL expiry, FIFO
//! lists, `DEL` returning existence) for tests and single-node development.
//! Expiry runs on the tokio clock, so tests can drive it with
//! `tokio::time::pause` / `advance`.

use async_trait::async_trait;
use gateway_core::{Error, Result};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::store::{ttl_millis, KeyedStore};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

#[derive(Default)]
struct State {
    values: HashMap<String, Entry>,
    lists: HashMap<String, VecDeque<String>>,
}

impl State {
    /// Drops `key` if its TTL has passed.
    fn purge_expired(&mut self, key: &str, now: Instant) {
        if self.values.get(key).is_some_and(|e| !e.is_live(now)) {
            self.values.remove(key);
        }
    }
}

/// In-memory keyed store. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    should_fail: Arc<AtomicBool>,
    writes: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with a store error (for error testing).
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    /// Number of mutating operations performed so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current length of a list.
    pub fn queue_len(&self, queue: &str) -> usize {
        self.state.lock().lists.get(queue).map_or(0, VecDeque::len)
    }

    /// Remaining TTL of a key, if it exists and has one.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let state = self.state.lock();
        let entry = state.values.get(key).filter(|e| e.is_live(now))?;
        entry.expires_at.map(|at| at.saturating_duration_since(now))
    }

    fn check(&self, op: &str) -> Result<()> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(Error::store(format!("{} failed: memory store unavailable", op)));
        }
        Ok(())
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyedStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check("GET")?;
        let now = Instant::now();
        let mut state = self.state.lock();
        state.purge_expired(key, now);
        Ok(state.values.get(key).map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        self.check("SET")?;
        self.record_write();
        let expires_at = ttl.map(|ttl| Instant::now() + Duration::from_millis(ttl_millis(ttl)));
        let mut state = self.state.lock();
        state.lists.remove(key);
        state.values.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.check("DEL")?;
        self.record_write();
        let now = Instant::now();
        let mut state = self.state.lock();
        state.purge_expired(key, now);
        let value_existed = state.values.remove(key).is_some();
        let list_existed = state.lists.remove(key).is_some();
        Ok(value_existed || list_existed)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.check("PEXPIRE")?;
        self.record_write();
        let now = Instant::now();
        let mut state = self.state.lock();
        state.purge_expired(key, now);
        match state.values.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(now + Duration::from_millis(ttl_millis(ttl)));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn rpush(&self, queue: &str, value: &str) -> Result<u64> {
        self.check("RPUSH")?;
        self.record_write();
        let mut state = self.state.lock();
        let list = state.lists.entry(queue.to_string()).or_default();
        list.push_back(value.to_string());
        Ok(list.len() as u64)
    }

    async fn lpop(&self, queue: &str) -> Result<Option<String>> {
        self.check("LPOP")?;
        let mut state = self.state.lock();
        let Some(list) = state.lists.get_mut(queue) else {
            return Ok(None);
        };
        let value = list.pop_front();
        if list.is_empty() {
            // Redis deletes empty lists
            state.lists.remove(queue);
        }
        if value.is_some() {
            self.record_write();
        }
        Ok(value)
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        self.check("SCAN")?;
        let now = Instant::now();
        let state = self.state.lock();
        let mut keys: Vec<String> = state
            .values
            .iter()
            .filter(|(k, e)| k.starts_with(prefix) && e.is_live(now))
            .map(|(k, _)| k.clone())
            .chain(state.lists.keys().filter(|k| k.starts_with(prefix)).cloned())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn ping(&self) -> Result<()> {
        self.check("PING")
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

//! The keyed store contract.

use async_trait::async_trait;
use gateway_core::Result;
use std::time::Duration;

/// Shared key/value and list store.
///
/// Implemented by [`RedisStore`](crate::RedisStore) in production and by
/// [`MemoryStore`](crate::MemoryStore) in tests and local development, so
/// the gateway and session manager exercise the same code paths against both.
/// Every method is a single atomic store operation; failures surface as
/// `Error::Store`.
#[async_trait]
pub trait KeyedStore: Send + Sync {
    /// `GET key`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// `SET key value [PX ttl]`, last writer wins.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// `DEL key`. Returns whether the key existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// `PEXPIRE key ttl`. Returns whether the key existed.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// `RPUSH queue value`. Returns the queue length after the push.
    async fn rpush(&self, queue: &str, value: &str) -> Result<u64>;

    /// `LPOP queue`
    async fn lpop(&self, queue: &str) -> Result<Option<String>>;

    /// All keys starting with `prefix`. Not atomic across keys; used for maintenance only.
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>>;

    /// Round trip to verify the store is reachable.
    async fn ping(&self) -> Result<()>;

    /// Backend name, for logs and health reports.
    fn backend(&self) -> &'static str;
}

/// Store TTLs are whole milliseconds and must be positive.
pub(crate) fn ttl_millis(ttl: Duration) -> u64 {
    (ttl.as_millis() as u64).max(1)
}

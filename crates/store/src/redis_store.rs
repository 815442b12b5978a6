//! Redis-backed keyed store.
//!
//! Uses a single multiplexed [`ConnectionManager`], which reconnects on its
//! own after a dropped connection. Cloning it is cheap, so every operation
//! works on its own clone.

use async_trait::async_trait;
use gateway_core::{Error, Result};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::store::{ttl_millis, KeyedStore};

/// Keys fetched per SCAN round trip.
const SCAN_BATCH: usize = 200;

fn store_err(op: &str, key: &str, e: RedisError) -> Error {
    Error::store(format!("{} {} failed: {}", op, key, e))
}

/// Keyed store backed by a Redis server.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    config: StoreConfig,
}

impl RedisStore {
    /// Connects to Redis, retrying up to `connect_retries` times.
    pub async fn connect(config: StoreConfig) -> Result<Self> {
        let client = redis::Client::open(config.url())
            .map_err(|e| Error::store(format!("Invalid Redis URL: {}", e)))?;

        let attempts = config.connect_retries.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match tokio::time::timeout(
                config.connect_timeout(),
                ConnectionManager::new(client.clone()),
            )
            .await
            {
                Ok(Ok(conn)) => {
                    info!(address = %config.address(), attempt, "Connected to Redis");
                    return Ok(Self { conn, config });
                }
                Ok(Err(e)) => last_error = e.to_string(),
                Err(_) => {
                    last_error = format!("timed out after {}ms", config.connect_timeout_ms)
                }
            }

            warn!(
                address = %config.address(),
                attempt,
                error = %last_error,
                "Redis connection attempt failed"
            );

            if attempt < attempts {
                tokio::time::sleep(config.retry_backoff()).await;
            }
        }

        Err(Error::store(format!(
            "Failed to connect to Redis at {}: {}",
            config.address(),
            last_error
        )))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

#[async_trait]
impl KeyedStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await.map_err(|e| store_err("GET", key, e))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(ttl_millis(ttl));
        }
        let _: () = cmd
            .query_async(&mut conn)
            .await
            .map_err(|e| store_err("SET", key, e))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await.map_err(|e| store_err("DEL", key, e))?;
        Ok(removed > 0)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        let updated: i64 = redis::cmd("PEXPIRE")
            .arg(key)
            .arg(ttl_millis(ttl))
            .query_async(&mut conn)
            .await
            .map_err(|e| store_err("PEXPIRE", key, e))?;
        Ok(updated == 1)
    }

    async fn rpush(&self, queue: &str, value: &str) -> Result<u64> {
        let mut conn = self.conn.clone();
        let len: u64 = conn
            .rpush(queue, value)
            .await
            .map_err(|e| store_err("RPUSH", queue, e))?;
        Ok(len)
    }

    async fn lpop(&self, queue: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("LPOP")
            .arg(queue)
            .query_async(&mut conn)
            .await
            .map_err(|e| store_err("LPOP", queue, e))?;
        Ok(value)
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", prefix);
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| store_err("SCAN", &pattern, e))?;

            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once
        keys.sort();
        keys.dedup();
        debug!(pattern = %pattern, count = keys.len(), "Scanned keys");
        Ok(keys)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| store_err("PING", &self.config.address(), e))?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

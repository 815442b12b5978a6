//! Session manager.
//!
//! The keyed store is the only source of truth: every call is a round trip
//! and nothing is cached in-process, so any gateway instance can serve any
//! session. A session lives `NonExistent → Active → (refreshed → Active)* →
//! Expired/Deleted`; every successful read pushes its expiry out by the full
//! window.

use gateway_core::keys::session_key;
use gateway_core::{Result, Session};
use keyed_store::KeyedStore;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use telemetry::metrics;
use tracing::{debug, warn};

use crate::config::SessionConfig;

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn KeyedStore>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(store: Arc<dyn KeyedStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    /// Mints a session and stores it with a full TTL.
    pub async fn create(
        &self,
        user_id: Option<String>,
        metadata: Option<HashMap<String, Value>>,
    ) -> Result<Session> {
        let session = Session::new(user_id, metadata.unwrap_or_default());
        self.write(&session).await?;

        metrics().sessions_created.inc();
        debug!(token = %session.token, "Session created");
        Ok(session)
    }

    /// Returns the session and extends its expiry.
    ///
    /// A record that fails to decode is reported as absent.
    pub async fn get(&self, token: &str) -> Result<Option<Session>> {
        let key = session_key(token);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };

        let session: Session = match serde_json::from_str(&raw) {
            Ok(session) => session,
            Err(e) => {
                warn!(token = %token, "Ignoring malformed session: {}", e);
                return Ok(None);
            }
        };

        self.store.expire(&key, self.config.ttl()).await?;
        Ok(Some(session))
    }

    /// Whether `token` names a live session. Extends it if so.
    pub async fn validate(&self, token: &str) -> Result<bool> {
        Ok(self.get(token).await?.is_some())
    }

    /// Merges `patch` into the session metadata and bumps its activity.
    ///
    /// Returns `None` without writing anything if the session doesn't exist.
    pub async fn update(
        &self,
        token: &str,
        patch: Option<HashMap<String, Value>>,
    ) -> Result<Option<Session>> {
        let Some(mut session) = self.get(token).await? else {
            return Ok(None);
        };

        session.touch(patch);
        self.write(&session).await?;
        Ok(Some(session))
    }

    /// Removes the session. Returns whether it existed.
    pub async fn delete(&self, token: &str) -> Result<bool> {
        let existed = self.store.delete(&session_key(token)).await?;
        debug!(token = %token, existed, "Session deleted");
        Ok(existed)
    }

    async fn write(&self, session: &Session) -> Result<()> {
        let raw = serde_json::to_string(session)?;
        self.store
            .set(&session_key(&session.token), &raw, Some(self.config.ttl()))
            .await
    }
}

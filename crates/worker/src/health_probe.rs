//! Periodic keyed store health probe.
//!
//! Keeps the `redis` component of the health registry current so the
//! readiness endpoint reflects a store that went away after startup.

use keyed_store::{health::check_connection, KeyedStore};
use std::sync::Arc;
use telemetry::{health, ComponentHealth};
use tracing::{error, info};

pub struct StoreHealthProbe {
    store: Arc<dyn KeyedStore>,
}

impl StoreHealthProbe {
    pub fn new(store: Arc<dyn KeyedStore>) -> Self {
        Self { store }
    }

    /// Pings the store and records the result in the global registry.
    pub async fn run(&self) -> bool {
        self.probe_into(&health().store).await
    }

    /// Pings the store and records the result in `component`.
    pub async fn probe_into(&self, component: &ComponentHealth) -> bool {
        let healthy = check_connection(self.store.as_ref()).await;

        if component.record(healthy, "ping failed") {
            if healthy {
                info!(backend = self.store.backend(), "Keyed store recovered");
            } else {
                error!(backend = self.store.backend(), "Keyed store unreachable");
            }
        }
        healthy
    }
}

//! Keyed store health checks.

use tracing::{debug, error};

use crate::store::KeyedStore;

/// Check keyed store connection health.
pub async fn check_connection(store: &dyn KeyedStore) -> bool {
    match store.ping().await {
        Ok(()) => {
            debug!(backend = store.backend(), "Keyed store connection healthy");
            true
        }
        Err(e) => {
            error!(backend = store.backend(), "Keyed store ping failed: {}", e);
            false
        }
    }
}

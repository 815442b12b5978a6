//! Application state shared across handlers.

use correlation::CorrelationGateway;
use keyed_store::KeyedStore;
use sessions::SessionManager;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Keyed store (Redis in production, in-memory in tests)
    pub store: Arc<dyn KeyedStore>,
    /// Request/reply correlation
    pub gateway: CorrelationGateway,
    /// Session lifecycle
    pub sessions: SessionManager,
}

impl AppState {
    pub fn new(
        store: Arc<dyn KeyedStore>,
        gateway: CorrelationGateway,
        sessions: SessionManager,
    ) -> Self {
        Self {
            store,
            gateway,
            sessions,
        }
    }
}

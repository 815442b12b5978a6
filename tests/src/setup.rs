//! Common test setup functions.

use api::{router, state::AppState};
use axum::Router;
use axum_test::TestServer;
use correlation::{CorrelationConfig, CorrelationGateway, ReplyDispatcher};
use keyed_store::{KeyedStore, MemoryStore};
use sessions::{SessionConfig, SessionManager};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::mocks::{ReplyMode, ScriptedWorker};

/// Correlation timings short enough for tests to hit the deadline quickly.
pub fn fast_correlation_config() -> CorrelationConfig {
    CorrelationConfig {
        response_timeout_secs: 1,
        poll_interval_ms: 20,
        error_backoff_ms: 50,
        ..CorrelationConfig::default()
    }
}

/// Test context over an in-memory keyed store.
///
/// Uses the real router with all middleware and a running reply dispatcher,
/// so requests take the same path they do in production.
pub struct TestContext {
    pub store: MemoryStore,
    pub gateway: CorrelationGateway,
    pub sessions: SessionManager,
    pub router: Router,
    dispatcher_task: JoinHandle<()>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(fast_correlation_config())
    }

    pub fn with_config(config: CorrelationConfig) -> Self {
        let store = MemoryStore::new();
        let shared: Arc<dyn KeyedStore> = Arc::new(store.clone());

        let dispatcher = Arc::new(ReplyDispatcher::new(shared.clone(), config.clone()));
        let dispatcher_task = tokio::spawn(dispatcher.clone().run());

        let gateway = CorrelationGateway::new(shared.clone(), dispatcher, config);
        let sessions = SessionManager::new(shared.clone(), SessionConfig::default());
        let router = router(AppState::new(shared, gateway.clone(), sessions.clone()));

        Self {
            store,
            gateway,
            sessions,
            router,
            dispatcher_task,
        }
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router.clone()).expect("Failed to create test server")
    }

    /// Starts a scripted worker on this context's store.
    pub fn worker(&self, mode: ReplyMode) -> ScriptedWorker {
        ScriptedWorker::spawn(self.store.clone(), mode)
    }

    /// Creates a live session directly, bypassing HTTP.
    pub async fn session_token(&self) -> String {
        self.sessions
            .create(None, None)
            .await
            .expect("Failed to create session")
            .token
    }

    /// Make every store operation fail (for error testing).
    pub fn set_store_failure(&self, should_fail: bool) {
        self.store.set_should_fail(should_fail);
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.dispatcher_task.abort();
    }
}

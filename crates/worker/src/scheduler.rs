//! Worker scheduler for background tasks.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::info;

use correlation::ReplyDispatcher;
use keyed_store::KeyedStore;

use crate::health_probe::StoreHealthProbe;

/// Worker scheduler configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Store health probe interval
    pub health_check_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            health_check_interval: Duration::from_secs(15),
        }
    }
}

/// Background worker scheduler.
pub struct WorkerScheduler {
    config: WorkerConfig,
    store: Arc<dyn KeyedStore>,
    dispatcher: Arc<ReplyDispatcher>,
}

impl WorkerScheduler {
    pub fn new(
        config: WorkerConfig,
        store: Arc<dyn KeyedStore>,
        dispatcher: Arc<ReplyDispatcher>,
    ) -> Self {
        Self {
            config,
            store,
            dispatcher,
        }
    }

    /// Starts all background workers. Abort the handles to stop them.
    pub fn start(self: Arc<Self>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        // The only consumer of the outbound queue in this process
        handles.push(tokio::spawn(self.dispatcher.clone().run()));
        info!("Reply dispatcher started");

        let scheduler = self.clone();
        handles.push(tokio::spawn(async move {
            scheduler.run_health_probe().await;
        }));

        info!("Background workers started");
        handles
    }

    async fn run_health_probe(&self) {
        let probe = StoreHealthProbe::new(self.store.clone());
        let mut ticker = interval(self.config.health_check_interval);

        loop {
            ticker.tick().await;
            probe.run().await;
        }
    }
}

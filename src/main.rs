//! Emotika chat gateway
//!
//! Bridges synchronous HTTP chat requests to an asynchronous worker:
//! - Requests are recorded and pushed onto the inbound queue
//! - Replies come back on the shared outbound queue or a per-request key
//! - Sessions slide their expiry on every use
//! - Background workers drain replies and probe the store

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use api::{router, AppState};
use correlation::{CorrelationConfig, CorrelationGateway, ReplyDispatcher};
use keyed_store::{health::check_connection, maintenance::clear_queues, KeyedStore, RedisStore, StoreConfig};
use sessions::{SessionConfig, SessionManager};
use telemetry::{health, init_tracing_from_env, metrics};
use worker::{WorkerConfig, WorkerScheduler};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    /// Drop both queues and pending direct replies before serving
    #[serde(default)]
    clear_queues_on_startup: bool,

    #[serde(default)]
    store: StoreConfig,

    #[serde(default)]
    correlation: CorrelationConfig,

    #[serde(default)]
    session: SessionConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            clear_queues_on_startup: false,
            store: StoreConfig::default(),
            correlation: CorrelationConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting Emotika gateway v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;

    info!(
        store = %config.store.address(),
        response_timeout_secs = config.correlation.response_timeout_secs,
        poll_interval_ms = config.correlation.poll_interval_ms,
        session_ttl_secs = config.session.ttl_secs,
        "Loaded configuration"
    );

    let store: Arc<dyn KeyedStore> = Arc::new(
        RedisStore::connect(config.store.clone())
            .await
            .context("Failed to connect to Redis")?,
    );

    check_health(store.as_ref()).await;

    if config.clear_queues_on_startup {
        match clear_queues(store.as_ref()).await {
            Ok(report) => info!(?report, "Cleared queues on startup"),
            Err(e) => warn!("Failed to clear queues on startup: {}", e),
        }
    }

    let dispatcher = Arc::new(ReplyDispatcher::new(
        store.clone(),
        config.correlation.clone(),
    ));
    let gateway = CorrelationGateway::new(
        store.clone(),
        dispatcher.clone(),
        config.correlation.clone(),
    );
    let sessions = SessionManager::new(store.clone(), config.session.clone());

    let worker_scheduler = Arc::new(WorkerScheduler::new(
        WorkerConfig::default(),
        store.clone(),
        dispatcher,
    ));
    let worker_handles = worker_scheduler.start();

    let app = router(AppState::new(store, gateway, sessions));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down...");

    for handle in worker_handles {
        handle.abort();
    }

    info!(metrics = ?metrics().snapshot(), "Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("EMOTIKA")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Deployment variables shared with the worker
    if let Ok(host) = std::env::var("REDIS_HOST") {
        config.store.host = host;
    }
    if let Ok(port) = std::env::var("REDIS_PORT") {
        config.store.port = port
            .trim()
            .parse()
            .with_context(|| format!("Invalid REDIS_PORT: {}", port))?;
    }
    if let Ok(password) = std::env::var("REDIS_PASSWORD") {
        config.store.password = Some(password);
    }

    Ok(config)
}

/// Check store health on startup.
async fn check_health(store: &dyn KeyedStore) {
    if check_connection(store).await {
        health().store.set_healthy();
        info!("Redis connection: healthy");
    } else {
        health().store.set_unhealthy("Connection failed");
        error!("Redis connection: unhealthy");
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}

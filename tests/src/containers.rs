//! Testcontainer setup for Redis.

use keyed_store::StoreConfig;
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage,
};

/// Container handle for Redis.
///
/// Set `EMOTIKA_TEST_REDIS_HOST` (and optionally `EMOTIKA_TEST_REDIS_PORT`)
/// to run against an existing server instead of starting a container.
pub struct TestContainers {
    #[allow(dead_code)]
    redis: Option<ContainerAsync<GenericImage>>,
    pub redis_host: String,
    pub redis_port: u16,
}

impl TestContainers {
    /// Start Redis container.
    pub async fn start() -> Self {
        if let Some(host) = std::env::var("EMOTIKA_TEST_REDIS_HOST")
            .ok()
            .filter(|v| !v.trim().is_empty())
        {
            let port = std::env::var("EMOTIKA_TEST_REDIS_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(6379);
            return Self {
                redis: None,
                redis_host: host,
                redis_port: port,
            };
        }

        let (redis, redis_port) = start_redis().await;

        Self {
            redis: Some(redis),
            redis_host: "127.0.0.1".to_string(),
            redis_port,
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            host: self.redis_host.clone(),
            port: self.redis_port,
            ..StoreConfig::default()
        }
    }
}

/// Start Redis container, return container and mapped port.
pub async fn start_redis() -> (ContainerAsync<GenericImage>, u16) {
    let image = GenericImage::new("redis", "7-alpine")
        .with_exposed_port(6379.tcp())
        .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"));

    let container = image.start().await.expect("Failed to start Redis");
    let port = container
        .get_host_port_ipv4(6379)
        .await
        .expect("Failed to map Redis port");

    (container, port)
}

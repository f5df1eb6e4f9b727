use std::future::Future;
use std::sync::Arc;

use health::{HealthHandle, HealthRegistry};
use metrics::counter;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::flags::FlagStore;
use crate::kv::{Client, MemoryClient, RedisClient};
use crate::metrics_utils::STORE_PING_FAILURES_COUNTER;
use crate::router;

pub async fn serve<F>(config: Config, listener: TcpListener, shutdown: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    let store: Arc<dyn Client + Send + Sync> = if config.uses_redis() {
        match RedisClient::new(config.redis_url.clone(), config.redis_timeout()).await {
            Ok(client) => Arc::new(client),
            Err(e) => {
                tracing::error!("Failed to create Redis client for URL {}: {}", config.redis_url, e);
                return;
            }
        }
    } else {
        tracing::warn!("REDIS_URL not set, using the in-memory store");
        Arc::new(MemoryClient::new())
    };

    if let Err(e) = FlagStore::new(store.clone()).seed_defaults().await {
        tracing::error!("Failed to seed default feature flags: {}", e);
        return;
    }

    let health = HealthRegistry::new("liveness");
    let interval = config.store_health_interval();
    let store_handle = health.register("kv_store", interval * 3).await;
    tokio::spawn(store_ping_loop(store.clone(), store_handle, interval));

    let app = router::router(store, health, config);

    match listener.local_addr() {
        Ok(addr) => tracing::info!("listening on {:?}", addr),
        Err(e) => tracing::warn!("listening on an unknown address: {}", e),
    }
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        tracing::error!("server error: {}", e);
    }
}

async fn store_ping_loop(
    store: Arc<dyn Client + Send + Sync>,
    handle: HealthHandle,
    interval: std::time::Duration,
) {
    loop {
        match store.ping().await {
            Ok(()) => handle.report_healthy().await,
            Err(e) => {
                tracing::warn!("store ping failed: {}", e);
                counter!(STORE_PING_FAILURES_COUNTER).increment(1);
                handle.report_unhealthy().await;
            }
        }
        tokio::time::sleep(interval).await;
    }
}

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Notify;

use flag_poller::config::PollSettings;
use invitation_api::config::Config;
use invitation_api::server::serve;

pub struct ServerHandle {
    pub addr: SocketAddr,
    pub admin_key: String,
    shutdown: Arc<Notify>,
}

impl ServerHandle {
    pub async fn for_config(config: Config) -> ServerHandle {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let admin_key = config.admin_key.clone();
        let notify = Arc::new(Notify::new());
        let shutdown = notify.clone();

        tokio::spawn(async move {
            serve(config, listener, async move { notify.notified().await }).await
        });
        ServerHandle {
            addr,
            admin_key,
            shutdown,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{:?}", self.addr)
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown.notify_one()
    }
}

/// Settings slow enough that a test can tell a scheduled poll from an
/// invalidation, fast enough to keep tests short.
pub fn test_settings() -> PollSettings {
    PollSettings {
        base_interval: Duration::from_secs(5),
        backoff_factor: 1.5,
        max_multiplier: 6.0,
        fetch_timeout: Duration::from_secs(2),
    }
}

/// Polls `check` every 10ms until it holds or `limit` passes.
pub async fn eventually(limit: Duration, check: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

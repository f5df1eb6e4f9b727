#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::Notify;

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

    pub fn url(&self, path: &str) -> String {
        format!("http://{:?}{}", self.addr, path)
    }

    pub fn basic_auth(&self) -> String {
        format!("Basic {}", STANDARD.encode(format!("admin:{}", self.admin_key)))
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        reqwest::Client::new()
            .get(self.url(path))
            .send()
            .await
            .expect("failed to send request")
    }

    pub async fn admin_get(&self, path: &str) -> reqwest::Response {
        reqwest::Client::new()
            .get(self.url(path))
            .header(AUTHORIZATION, self.basic_auth())
            .send()
            .await
            .expect("failed to send request")
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(self.url(path))
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("failed to send request")
    }

    /// PATCH with an optional Authorization header value.
    pub async fn patch_json(
        &self,
        path: &str,
        body: &Value,
        authorization: Option<String>,
    ) -> reqwest::Response {
        let mut request = reqwest::Client::new()
            .patch(self.url(path))
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string());
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }
        request.send().await.expect("failed to send request")
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown.notify_one()
    }
}

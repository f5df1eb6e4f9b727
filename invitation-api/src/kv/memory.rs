use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Client, StoreError};

#[derive(Default)]
struct Inner {
    values: BTreeMap<String, String>,
    counters: HashMap<String, i64>,
}

/// In-process store used when no redis url is configured, and by tests.
/// Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryClient {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryClient {
    pub fn new() -> MemoryClient {
        MemoryClient::default()
    }
}

#[async_trait]
impl Client for MemoryClient {
    async fn get(&self, k: String) -> Result<String, StoreError> {
        let inner = self.inner.read().await;
        inner.values.get(&k).cloned().ok_or(StoreError::NotFound)
    }

    async fn set(&self, k: String, v: String) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.values.insert(k, v);
        Ok(())
    }

    async fn keys(&self, prefix: String) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .values
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    async fn incr(&self, k: String) -> Result<i64, StoreError> {
        let mut inner = self.inner.write().await;
        let counter = inner.counters.entry(k).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

use std::sync::Arc;

use async_trait::async_trait;

use crate::flags::FlagStore;
use crate::kv::{Client, MemoryClient, StoreError};

/// A store that fails every call, for exercising the unavailable paths.
pub struct UnavailableClient;

#[async_trait]
impl Client for UnavailableClient {
    async fn get(&self, _k: String) -> Result<String, StoreError> {
        Err(unavailable())
    }

    async fn set(&self, _k: String, _v: String) -> Result<(), StoreError> {
        Err(unavailable())
    }

    async fn keys(&self, _prefix: String) -> Result<Vec<String>, StoreError> {
        Err(unavailable())
    }

    async fn incr(&self, _k: String) -> Result<i64, StoreError> {
        Err(unavailable())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(unavailable())
    }
}

fn unavailable() -> StoreError {
    StoreError::Unavailable("connection refused".to_string())
}

/// An in-memory store holding the default flags.
pub async fn seeded_memory_store() -> Arc<MemoryClient> {
    let client = Arc::new(MemoryClient::new());
    FlagStore::new(client.clone())
        .seed_defaults()
        .await
        .expect("seeding an in-memory store cannot fail");
    client
}

use async_trait::async_trait;
use thiserror::Error;

mod memory;
mod records;
mod redis_client;

pub use self::memory::MemoryClient;
pub use self::records::RecordStore;
pub use self::redis_client::RedisClient;

#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Not found in store")]
    NotFound,
    #[error("Timeout error")]
    Timeout,
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::ParseError(err.to_string())
    }
}

/// The handful of key-value operations the invitation site needs.
/// Values are JSON strings; keys are `<prefix>:<id>`.
#[async_trait]
pub trait Client {
    async fn get(&self, k: String) -> Result<String, StoreError>;
    async fn set(&self, k: String, v: String) -> Result<(), StoreError>;
    /// All keys starting with `prefix`, in no particular order.
    async fn keys(&self, prefix: String) -> Result<Vec<String>, StoreError>;
    /// Atomically increments a counter and returns the new value.
    async fn incr(&self, k: String) -> Result<i64, StoreError>;
    async fn ping(&self) -> Result<(), StoreError>;
}

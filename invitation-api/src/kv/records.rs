use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::instrument;

use super::{Client, StoreError};

/// Typed JSON records stored under `<prefix>:<key>`, with a per-prefix id
/// counter kept at `counter:<prefix>`.
pub struct RecordStore<T> {
    client: Arc<dyn Client + Send + Sync>,
    prefix: &'static str,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for RecordStore<T> {
    fn clone(&self) -> Self {
        RecordStore {
            client: self.client.clone(),
            prefix: self.prefix,
            _record: PhantomData,
        }
    }
}

impl<T> RecordStore<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(client: Arc<dyn Client + Send + Sync>, prefix: &'static str) -> Self {
        RecordStore {
            client,
            prefix,
            _record: PhantomData,
        }
    }

    fn key_for(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    pub async fn next_id(&self) -> Result<i64, StoreError> {
        self.client.incr(format!("counter:{}", self.prefix)).await
    }

    pub async fn save(&self, key: &str, record: &T) -> Result<(), StoreError> {
        let serialized = serde_json::to_string(record)?;
        self.client.set(self.key_for(key), serialized).await
    }

    /// `Ok(None)` when the key does not exist; store failures stay errors.
    pub async fn find(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.client.get(self.key_for(key)).await {
            Ok(serialized) => Ok(Some(serde_json::from_str(&serialized)?)),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip_all, fields(prefix = self.prefix))]
    pub async fn all(&self) -> Result<Vec<T>, StoreError> {
        let keys = self.client.keys(format!("{}:", self.prefix)).await?;
        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            match self.client.get(key).await {
                Ok(serialized) => records.push(serde_json::from_str(&serialized)?),
                // deleted between KEYS and GET
                Err(StoreError::NotFound) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }
}

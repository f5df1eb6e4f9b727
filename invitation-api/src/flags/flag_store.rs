use std::sync::Arc;

use chrono::Utc;
use common_types::FeatureFlag;
use tracing::instrument;

use crate::flags::defaults::default_flags;
use crate::kv::{Client, RecordStore, StoreError};

pub const FLAG_KEY_PREFIX: &str = "feature_flag";

/// Flag records keyed by `feature_flag:<featureKey>`, so lookups by key are a
/// single GET.
#[derive(Clone)]
pub struct FlagStore {
    records: RecordStore<FeatureFlag>,
}

impl FlagStore {
    pub fn new(client: Arc<dyn Client + Send + Sync>) -> Self {
        FlagStore {
            records: RecordStore::new(client, FLAG_KEY_PREFIX),
        }
    }

    /// Writes the default flags if the store holds none. Returns how many were
    /// written, so zero means an existing store was left untouched.
    #[instrument(skip_all)]
    pub async fn seed_defaults(&self) -> Result<usize, StoreError> {
        if !self.records.all().await?.is_empty() {
            return Ok(0);
        }

        let flags = default_flags(Utc::now());
        for flag in &flags {
            self.records.save(&flag.feature_key, flag).await?;
        }
        tracing::info!(count = flags.len(), "seeded default feature flags");
        Ok(flags.len())
    }

    pub async fn find(&self, feature_key: &str) -> Result<Option<FeatureFlag>, StoreError> {
        let flag = self.records.find(feature_key).await?;
        if let Some(flag) = &flag {
            flag.validate()
                .map_err(|e| StoreError::ParseError(e.to_string()))?;
        }
        Ok(flag)
    }

    /// All flags, sorted by display name.
    #[instrument(skip_all)]
    pub async fn list(&self) -> Result<Vec<FeatureFlag>, StoreError> {
        let mut flags = self.records.all().await?;
        for flag in &flags {
            flag.validate()
                .map_err(|e| StoreError::ParseError(e.to_string()))?;
        }
        flags.sort_by(|a, b| a.feature_name.cmp(&b.feature_name));
        Ok(flags)
    }

    pub async fn update(&self, flag: &FeatureFlag) -> Result<(), StoreError> {
        self.records.save(&flag.feature_key, flag).await
    }
}

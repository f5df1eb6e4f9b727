use chrono::{DateTime, Duration, Utc};
use common_types::FeatureFlag;
use metrics::counter;
use tracing::instrument;

use crate::api::errors::ApiError;
use crate::flags::FlagStore;
use crate::metrics_utils::FLAG_TOGGLES_COUNTER;

/// Read and toggle operations over the flag store. The store is the single
/// source of truth; nothing here caches.
#[derive(Clone)]
pub struct FlagService {
    store: FlagStore,
}

/// Next value of a flag's write marker: now, or one microsecond past the
/// previous marker if the clock has not moved past it.
pub fn next_write_marker(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

impl FlagService {
    pub fn new(store: FlagStore) -> Self {
        FlagService { store }
    }

    #[instrument(skip_all)]
    pub async fn list_flags(&self) -> Result<Vec<FeatureFlag>, ApiError> {
        Ok(self.store.list().await?)
    }

    #[instrument(skip(self))]
    pub async fn get_flag(&self, feature_key: &str) -> Result<FeatureFlag, ApiError> {
        self.store
            .find(feature_key)
            .await?
            .ok_or_else(|| not_found(feature_key))
    }

    /// Sets `enabled` and moves `updated_at` forward, even if the value is
    /// unchanged. Unknown keys fail without creating anything.
    ///
    /// Last write wins: two concurrent toggles of the same key both succeed
    /// and the store keeps whichever landed second.
    #[instrument(skip(self))]
    pub async fn set_enabled(
        &self,
        feature_key: &str,
        enabled: bool,
    ) -> Result<FeatureFlag, ApiError> {
        let existing = self
            .store
            .find(feature_key)
            .await?
            .ok_or_else(|| not_found(feature_key))?;

        let updated = existing.with_enabled(enabled, next_write_marker(existing.updated_at));
        self.store.update(&updated).await?;

        counter!(
            FLAG_TOGGLES_COUNTER,
            "feature_key" => updated.feature_key.clone(),
            "enabled" => enabled.to_string()
        )
        .increment(1);
        tracing::info!(
            feature_key = %updated.feature_key,
            enabled,
            updated_at = %updated.updated_at,
            "feature flag updated"
        );
        Ok(updated)
    }
}

fn not_found(feature_key: &str) -> ApiError {
    ApiError::NotFound(format!("Feature flag '{feature_key}' not found"))
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{require_non_empty, ValidationError};

/// Keys of the guest-facing features that can be switched off by an admin.
pub mod keys {
    pub const RSVP: &str = "rsvp";
    pub const MESSAGES: &str = "messages";
    pub const GALLERY: &str = "gallery";
    pub const MUSIC: &str = "music";
    pub const COUNTDOWN: &str = "countdown";

    pub const ALL: [&str; 5] = [RSVP, MESSAGES, GALLERY, MUSIC, COUNTDOWN];
}

/// A named boolean toggle controlling one guest-facing feature.
///
/// `feature_key` never changes once the flag exists. `updated_at` is a write
/// marker: every write moves it forward, even when `enabled` is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlag {
    pub id: i64,
    pub feature_key: String,
    pub feature_name: String,
    pub description: String,
    pub enabled: bool,
    pub updated_at: DateTime<Utc>,
}

impl FeatureFlag {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("featureKey", &self.feature_key)?;
        require_non_empty("featureName", &self.feature_name)?;
        require_non_empty("description", &self.description)?;
        Ok(())
    }

    /// Returns a copy with `enabled` set and the write marker moved to `at`.
    pub fn with_enabled(&self, enabled: bool, at: DateTime<Utc>) -> FeatureFlag {
        FeatureFlag {
            enabled,
            updated_at: at,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlagsResponse {
    pub feature_flags: Vec<FeatureFlag>,
}

/// Body of an admin toggle. `enabled` is optional on the wire so that a
/// missing value can be rejected with a useful message instead of a parse
/// error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleFlagRequest {
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleFlagResponse {
    pub message: String,
    pub feature_flag: FeatureFlag,
}

use common_types::{FeatureFlag, Media, RsvpListResponse};

use crate::client::{ApiClient, PollError};
use crate::poller::FlagHandle;

/// The admin dashboard's view of the API. Toggling a flag invalidates this
/// session's own poller so the dashboard shows the new value right away;
/// other sessions pick it up on their next poll.
pub struct AdminSession {
    client: ApiClient,
    admin_key: String,
    flags: FlagHandle,
}

impl AdminSession {
    /// Checks the key with the server before handing out a session.
    pub async fn login(
        client: ApiClient,
        admin_key: impl Into<String>,
        flags: FlagHandle,
    ) -> Result<AdminSession, PollError> {
        let admin_key = admin_key.into();
        client.authenticate(&admin_key).await?;
        tracing::info!("admin session started");
        Ok(AdminSession {
            client,
            admin_key,
            flags,
        })
    }

    pub fn flags(&self) -> &FlagHandle {
        &self.flags
    }

    /// Flips one flag. On failure nothing changes locally; the error's
    /// `user_message` is what the dashboard shows.
    pub async fn set_enabled(
        &self,
        feature_key: &str,
        enabled: bool,
    ) -> Result<FeatureFlag, PollError> {
        match self
            .client
            .set_flag(&self.admin_key, feature_key, enabled)
            .await
        {
            Ok(response) => {
                tracing::info!(feature_key, enabled, "{}", response.message);
                self.flags.invalidate();
                Ok(response.feature_flag)
            }
            Err(e) => {
                tracing::warn!(feature_key, "failed to toggle feature flag: {}", e);
                Err(e)
            }
        }
    }

    pub async fn list_rsvps(&self) -> Result<RsvpListResponse, PollError> {
        self.client.list_rsvps(&self.admin_key).await
    }

    pub async fn list_media(&self) -> Result<Vec<Media>, PollError> {
        Ok(self.client.list_media(&self.admin_key).await?.media)
    }

    pub async fn approve_media(&self, id: i64, approved: bool) -> Result<Media, PollError> {
        Ok(self
            .client
            .approve_media(&self.admin_key, id, approved)
            .await?
            .media)
    }
}

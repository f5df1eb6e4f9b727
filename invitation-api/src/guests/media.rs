use std::sync::Arc;

use chrono::Utc;
use common_types::{Media, NewMedia};
use tracing::instrument;

use crate::api::errors::ApiError;
use crate::guests::present;
use crate::kv::{Client, RecordStore};

pub const MEDIA_KEY_PREFIX: &str = "media";

const DEFAULT_NAME: &str = "Guest";
const DEFAULT_EMAIL: &str = "guest@wedding.com";

/// Guest photo and video submissions. New media stays hidden from the public
/// gallery until an admin approves it.
#[derive(Clone)]
pub struct MediaService {
    records: RecordStore<Media>,
}

impl MediaService {
    pub fn new(client: Arc<dyn Client + Send + Sync>) -> Self {
        MediaService {
            records: RecordStore::new(client, MEDIA_KEY_PREFIX),
        }
    }

    #[instrument(skip_all)]
    pub async fn create(&self, submission: NewMedia) -> Result<Media, ApiError> {
        let (Some(media_url), Some(media_type)) =
            (present(submission.media_url), submission.media_type)
        else {
            return Err(ApiError::BadRequest(
                "Media URL and media type are required".to_string(),
            ));
        };

        let media = Media {
            id: self.records.next_id().await?,
            name: present(submission.name).unwrap_or_else(|| DEFAULT_NAME.to_string()),
            email: present(submission.email).unwrap_or_else(|| DEFAULT_EMAIL.to_string()),
            media_url,
            media_type,
            caption: present(submission.caption),
            approved: false,
            created_at: Utc::now(),
        };
        media.validate()?;
        self.records.save(&media.id.to_string(), &media).await?;

        tracing::info!(id = media.id, media_type = ?media.media_type, "media submitted");
        Ok(media)
    }

    /// Everything, newest first. Admin only.
    pub async fn list_all(&self) -> Result<Vec<Media>, ApiError> {
        let mut media = self.records.all().await?;
        media.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(media)
    }

    /// What the public gallery shows.
    pub async fn list_approved(&self) -> Result<Vec<Media>, ApiError> {
        let mut media = self.list_all().await?;
        media.retain(|m| m.approved);
        Ok(media)
    }

    #[instrument(skip(self))]
    pub async fn set_approved(&self, id: i64, approved: bool) -> Result<Media, ApiError> {
        let mut media = self
            .records
            .find(&id.to_string())
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Media with id {id} not found")))?;

        media.approved = approved;
        self.records.save(&id.to_string(), &media).await?;
        tracing::info!(id, approved, "media moderated");
        Ok(media)
    }
}

pub fn moderation_message(media: &Media) -> String {
    if media.approved {
        "Media approved".to_string()
    } else {
        "Media rejected".to_string()
    }
}

#[cfg(test)]
mod tests {
    use common_types::MediaType;

    use super::*;
    use crate::kv::MemoryClient;

    fn service() -> MediaService {
        MediaService::new(Arc::new(MemoryClient::new()))
    }

    fn photo(url: &str) -> NewMedia {
        NewMedia {
            media_url: Some(url.to_string()),
            media_type: Some(MediaType::Image),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn anonymous_upload_gets_guest_defaults() {
        let media = service().create(photo("/uploads/a.jpg")).await.unwrap();
        assert_eq!(media.name, "Guest");
        assert_eq!(media.email, "guest@wedding.com");
        assert!(!media.approved);
        assert_eq!(media.caption, None);
    }

    #[tokio::test]
    async fn only_approved_media_is_public() {
        let service = service();
        let first = service.create(photo("/uploads/a.jpg")).await.unwrap();
        let second = service
            .create(photo("https://cdn.example.com/b.jpg"))
            .await
            .unwrap();

        service.set_approved(second.id, true).await.unwrap();

        let public = service.list_approved().await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].id, second.id);

        let all: Vec<i64> = service
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(all, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn rejecting_hides_approved_media_again() {
        let service = service();
        let media = service.create(photo("/uploads/a.jpg")).await.unwrap();
        service.set_approved(media.id, true).await.unwrap();
        let rejected = service.set_approved(media.id, false).await.unwrap();

        assert_eq!(moderation_message(&rejected), "Media rejected");
        assert!(service.list_approved().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        match service().set_approved(42, true).await {
            Err(ApiError::NotFound(msg)) => assert_eq!(msg, "Media with id 42 not found"),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_type_or_bad_url_is_rejected() {
        let mut no_type = photo("/uploads/a.jpg");
        no_type.media_type = None;
        assert!(matches!(
            service().create(no_type).await,
            Err(ApiError::BadRequest(_))
        ));

        match service().create(photo("not a url")).await {
            Err(ApiError::BadRequest(msg)) => assert_eq!(msg, "Valid media URL is required"),
            other => panic!("Expected BadRequest, got {:?}", other),
        }
    }
}

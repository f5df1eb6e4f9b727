use std::sync::Arc;

use chrono::Utc;
use common_types::{Message, NewMessage};
use tracing::instrument;

use crate::api::errors::ApiError;
use crate::guests::present;
use crate::kv::{Client, RecordStore};

pub const MESSAGE_KEY_PREFIX: &str = "message";

/// The congratulations wall.
#[derive(Clone)]
pub struct MessageService {
    records: RecordStore<Message>,
}

impl MessageService {
    pub fn new(client: Arc<dyn Client + Send + Sync>) -> Self {
        MessageService {
            records: RecordStore::new(client, MESSAGE_KEY_PREFIX),
        }
    }

    #[instrument(skip_all)]
    pub async fn submit(&self, submission: NewMessage) -> Result<Message, ApiError> {
        let (Some(name), Some(email), Some(content)) = (
            present(submission.name),
            present(submission.email),
            present(submission.content),
        ) else {
            return Err(ApiError::BadRequest(
                "Name, email, and content are required".to_string(),
            ));
        };

        let message = Message {
            id: self.records.next_id().await?,
            name,
            email,
            content,
            created_at: Utc::now(),
        };
        message.validate()?;
        self.records.save(&message.id.to_string(), &message).await?;

        tracing::info!(id = message.id, "message posted");
        Ok(message)
    }

    /// Newest first.
    pub async fn list(&self) -> Result<Vec<Message>, ApiError> {
        let mut messages = self.records.all().await?;
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(messages)
    }
}

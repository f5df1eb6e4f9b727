use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{require_email, require_media_url, require_non_empty, ValidationError};

/// Companions one guest may bring along.
pub const MAX_GUEST_COUNT: i64 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rsvp {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub attending: bool,
    pub guest_count: Option<i64>,
}

impl Rsvp {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_email(&self.email)?;
        match self.guest_count {
            Some(count) if count < 0 => Err(ValidationError::NegativeGuestCount),
            Some(count) if count > MAX_GUEST_COUNT => {
                Err(ValidationError::TooManyGuests(MAX_GUEST_COUNT))
            }
            _ => Ok(()),
        }
    }

    /// The guest plus the companions they bring, or zero when declining.
    pub fn total_attendees(&self) -> i64 {
        if !self.attending {
            return 0;
        }
        self.guest_count.unwrap_or(0).max(0).saturating_add(1)
    }
}

/// RSVP form submission. Fields are optional so the handler can report
/// which one is missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRsvp {
    pub name: Option<String>,
    pub email: Option<String>,
    pub attending: Option<bool>,
    pub guest_count: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpStatistics {
    pub total_invited: usize,
    pub total_attending: usize,
    pub total_not_attending: usize,
    pub total_guests: i64,
}

impl RsvpStatistics {
    pub fn from_rsvps(rsvps: &[Rsvp]) -> Self {
        let total_attending = rsvps.iter().filter(|r| r.attending).count();
        RsvpStatistics {
            total_invited: rsvps.len(),
            total_attending,
            total_not_attending: rsvps.len() - total_attending,
            total_guests: rsvps
                .iter()
                .map(Rsvp::total_attendees)
                .fold(0, i64::saturating_add),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RsvpResponse {
    pub message: String,
    pub rsvp: Rsvp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RsvpListResponse {
    pub rsvps: Vec<Rsvp>,
    pub statistics: RsvpStatistics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub media_url: String,
    pub media_type: MediaType,
    pub caption: Option<String>,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

impl Media {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_email(&self.email)?;
        require_media_url(&self.media_url)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMedia {
    pub name: Option<String>,
    pub email: Option<String>,
    pub media_url: Option<String>,
    pub media_type: Option<MediaType>,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaResponse {
    pub message: String,
    pub media: Media,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaListResponse {
    pub media: Vec<Media>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveMediaRequest {
    pub approved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_email(&self.email)?;
        require_non_empty("content", &self.content)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewMessage {
    pub name: Option<String>,
    pub email: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    pub data: Message,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageListResponse {
    pub messages: Vec<Message>,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAuthRequest {
    pub admin_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminAuthResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

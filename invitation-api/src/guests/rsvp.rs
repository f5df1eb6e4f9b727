use std::sync::Arc;

use common_types::{NewRsvp, Rsvp, RsvpListResponse, RsvpStatistics};
use tracing::instrument;

use crate::api::errors::ApiError;
use crate::guests::present;
use crate::kv::{Client, RecordStore};

pub const RSVP_KEY_PREFIX: &str = "rsvp";

const MISSING_FIELDS: &str = "Name, email, and attending status are required";

#[derive(Clone)]
pub struct RsvpService {
    records: RecordStore<Rsvp>,
}

impl RsvpService {
    pub fn new(client: Arc<dyn Client + Send + Sync>) -> Self {
        RsvpService {
            records: RecordStore::new(client, RSVP_KEY_PREFIX),
        }
    }

    /// Records a guest's answer. A second submission from the same email
    /// (case-insensitive) replaces the first and keeps its id.
    #[instrument(skip_all)]
    pub async fn submit(&self, submission: NewRsvp) -> Result<Rsvp, ApiError> {
        let (Some(name), Some(email), Some(attending)) = (
            present(submission.name),
            present(submission.email),
            submission.attending,
        ) else {
            return Err(ApiError::BadRequest(MISSING_FIELDS.to_string()));
        };

        let existing = self
            .records
            .all()
            .await?
            .into_iter()
            .find(|r| r.email.eq_ignore_ascii_case(&email));
        let id = match &existing {
            Some(previous) => previous.id,
            None => self.records.next_id().await?,
        };

        let rsvp = Rsvp {
            id,
            name,
            email: email.to_lowercase(),
            attending,
            guest_count: submission.guest_count,
        };
        rsvp.validate()?;
        self.records.save(&id.to_string(), &rsvp).await?;

        tracing::info!(
            id,
            attending,
            updated = existing.is_some(),
            "rsvp recorded"
        );
        Ok(rsvp)
    }

    /// All RSVPs by id, with the attendance summary for the dashboard.
    #[instrument(skip_all)]
    pub async fn list_with_statistics(&self) -> Result<RsvpListResponse, ApiError> {
        let mut rsvps = self.records.all().await?;
        rsvps.sort_by_key(|r| r.id);
        let statistics = RsvpStatistics::from_rsvps(&rsvps);
        Ok(RsvpListResponse { rsvps, statistics })
    }
}

pub fn confirmation_message(rsvp: &Rsvp) -> String {
    let verb = if rsvp.attending {
        "confirmed"
    } else {
        "declined"
    };
    format!("RSVP {verb} for {}", rsvp.name)
}

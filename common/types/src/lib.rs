mod flag;
mod guest;
mod validation;

// Feature flags
pub use flag::keys;
pub use flag::FeatureFlag;
pub use flag::FeatureFlagsResponse;
pub use flag::ToggleFlagRequest;
pub use flag::ToggleFlagResponse;

// Guest content
pub use guest::ApproveMediaRequest;
pub use guest::Media;
pub use guest::MediaListResponse;
pub use guest::MediaResponse;
pub use guest::MediaType;
pub use guest::Message;
pub use guest::MessageListResponse;
pub use guest::MessageResponse;
pub use guest::NewMedia;
pub use guest::NewMessage;
pub use guest::NewRsvp;
pub use guest::Rsvp;
pub use guest::MAX_GUEST_COUNT;
pub use guest::RsvpListResponse;
pub use guest::RsvpResponse;
pub use guest::RsvpStatistics;

// Shared envelopes
pub use guest::AdminAuthRequest;
pub use guest::AdminAuthResponse;
pub use guest::ErrorResponse;

pub use validation::ValidationError;

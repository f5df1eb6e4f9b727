use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("Valid email is required")]
    InvalidEmail,
    #[error("Valid media URL is required")]
    InvalidUrl,
    #[error("Guest count cannot be negative")]
    NegativeGuestCount,
    #[error("Guest count cannot exceed {0}")]
    TooManyGuests(i64),
}

pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Missing(field));
    }
    Ok(())
}

pub(crate) fn require_email(value: &str) -> Result<(), ValidationError> {
    if EMAIL_REGEX.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

/// Relative paths (`/uploads/...`) are accepted alongside absolute URLs.
pub(crate) fn require_media_url(value: &str) -> Result<(), ValidationError> {
    if value.starts_with('/') || url::Url::parse(value).is_ok() {
        Ok(())
    } else {
        Err(ValidationError::InvalidUrl)
    }
}

pub mod media;
pub mod messages;
pub mod rsvp;

pub use media::MediaService;
pub use messages::MessageService;
pub use rsvp::RsvpService;

/// Trimmed value of a submitted field, or None when missing or blank.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_are_missing() {
        assert_eq!(present(None), None);
        assert_eq!(present(Some("   ".to_string())), None);
        assert_eq!(present(Some(" Ana ".to_string())), Some("Ana".to_string()));
    }
}

use chrono::{DateTime, Utc};
use common_types::{keys, FeatureFlag};

/// Flags written the first time the store is initialized. The enabled values
/// are product decisions and must not drift.
pub const DEFAULT_FLAGS: [(&str, &str, &str, bool); 5] = [
    (
        keys::RSVP,
        "RSVP Form",
        "Allow guests to submit their attendance confirmation",
        true,
    ),
    (
        keys::MESSAGES,
        "Message Board",
        "Allow guests to leave congratulatory messages",
        false,
    ),
    (
        keys::GALLERY,
        "Photo Gallery",
        "Display wedding memories and allow photo uploads",
        true,
    ),
    (
        keys::MUSIC,
        "Background Music",
        "Play background music on the invitation page",
        false,
    ),
    (
        keys::COUNTDOWN,
        "Wedding Countdown",
        "Show countdown timer to wedding date",
        false,
    ),
];

pub fn default_flags(seeded_at: DateTime<Utc>) -> Vec<FeatureFlag> {
    DEFAULT_FLAGS
        .iter()
        .enumerate()
        .map(|(index, (key, name, description, enabled))| FeatureFlag {
            id: index as i64 + 1,
            feature_key: key.to_string(),
            feature_name: name.to_string(),
            description: description.to_string(),
            enabled: *enabled,
            updated_at: seeded_at,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(keys::RSVP, true)]
    #[case(keys::MESSAGES, false)]
    #[case(keys::GALLERY, true)]
    #[case(keys::MUSIC, false)]
    #[case(keys::COUNTDOWN, false)]
    fn seed_values(#[case] key: &str, #[case] enabled: bool) {
        let flags = default_flags(Utc::now());
        let flag = flags.iter().find(|f| f.feature_key == key).unwrap();
        assert_eq!(flag.enabled, enabled);
    }

    #[test]
    fn seeds_are_valid_and_unique() {
        let flags = default_flags(Utc::now());
        assert_eq!(flags.len(), keys::ALL.len());
        for flag in &flags {
            flag.validate().unwrap();
        }
        let ids: HashSet<i64> = flags.iter().map(|f| f.id).collect();
        assert_eq!(ids, HashSet::from([1, 2, 3, 4, 5]));

        let feature_keys: HashSet<&str> = flags.iter().map(|f| f.feature_key.as_str()).collect();
        assert_eq!(feature_keys, HashSet::from(keys::ALL));
    }
}

use std::fmt;

use common_types::keys;

/// Sections of the guest page, in page order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GuestSection {
    Navigation,
    Hero,
    Countdown,
    Couple,
    Details,
    Gallery,
    Rsvp,
    Messages,
    Footer,
    MusicPlayer,
}

pub const PAGE_ORDER: [GuestSection; 10] = [
    GuestSection::Navigation,
    GuestSection::Hero,
    GuestSection::Countdown,
    GuestSection::Couple,
    GuestSection::Details,
    GuestSection::Gallery,
    GuestSection::Rsvp,
    GuestSection::Messages,
    GuestSection::Footer,
    GuestSection::MusicPlayer,
];

impl GuestSection {
    /// The flag a section is gated on; `None` for sections that always show.
    pub fn feature_key(self) -> Option<&'static str> {
        match self {
            GuestSection::Countdown => Some(keys::COUNTDOWN),
            GuestSection::Gallery => Some(keys::GALLERY),
            GuestSection::Rsvp => Some(keys::RSVP),
            GuestSection::Messages => Some(keys::MESSAGES),
            GuestSection::MusicPlayer => Some(keys::MUSIC),
            GuestSection::Navigation
            | GuestSection::Hero
            | GuestSection::Couple
            | GuestSection::Details
            | GuestSection::Footer => None,
        }
    }
}

impl fmt::Display for GuestSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GuestSection::Navigation => "navigation",
            GuestSection::Hero => "hero",
            GuestSection::Countdown => "countdown",
            GuestSection::Couple => "couple",
            GuestSection::Details => "details",
            GuestSection::Gallery => "gallery",
            GuestSection::Rsvp => "rsvp",
            GuestSection::Messages => "messages",
            GuestSection::Footer => "footer",
            GuestSection::MusicPlayer => "music-player",
        };
        f.write_str(name)
    }
}

/// The sections mounted for one render. Each gate is read once.
pub fn guest_page(is_enabled: impl Fn(&str) -> bool) -> Vec<GuestSection> {
    PAGE_ORDER
        .into_iter()
        .filter(|section| section.feature_key().map_or(true, &is_enabled))
        .collect()
}

//! Domain models persisted as JSON documents and passed throughout the TUI.
//! The types stay light-weight data holders; numeric presentation settings are
//! clamped on every write path so the rest of the crate can trust them.

use std::fmt;
use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Allowed lyric font sizes.
pub const FONT_SIZE_RANGE: RangeInclusive<u32> = 12..=48;
/// Allowed scroll speeds in pixels per second.
pub const SCROLL_SPEED_RANGE: RangeInclusive<u32> = 10..=200;
/// Allowed autoplay delays in seconds.
pub const AUTOPLAY_DELAY_RANGE: RangeInclusive<u32> = 1..=30;

/// Step used by the reader's font size buttons.
pub const FONT_SIZE_STEP: i64 = 2;
/// Step used by the reader's scroll speed buttons.
pub const SCROLL_SPEED_STEP: i64 = 10;

fn clamp_to(value: i64, range: &RangeInclusive<u32>) -> u32 {
    value.clamp(i64::from(*range.start()), i64::from(*range.end())) as u32
}

/// Clamp any requested font size into [`FONT_SIZE_RANGE`].
pub fn clamp_font_size(value: i64) -> u32 {
    clamp_to(value, &FONT_SIZE_RANGE)
}

/// Clamp any requested scroll speed into [`SCROLL_SPEED_RANGE`].
pub fn clamp_scroll_speed(value: i64) -> u32 {
    clamp_to(value, &SCROLL_SPEED_RANGE)
}

/// Clamp any requested autoplay delay into [`AUTOPLAY_DELAY_RANGE`].
pub fn clamp_autoplay_delay(value: i64) -> u32 {
    clamp_to(value, &AUTOPLAY_DELAY_RANGE)
}

/// Reasons a library mutation is refused. The UI shows these as a single
/// status notice and keeps the form open.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Song name is required.")]
    EmptySongName,
    #[error("Song author is required.")]
    EmptySongAuthor,
    #[error("Setlist name is required.")]
    EmptySetlistName,
    #[error("Song {0} not found.")]
    SongNotFound(String),
    #[error("Setlist {0} not found.")]
    SetlistNotFound(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// A song in the library together with its per-song reader preferences.
pub struct Song {
    /// Opaque identifier. Setlists reference songs through it.
    pub id: String,
    /// Title displayed in lists and in the reader header.
    pub name: String,
    pub author: String,
    /// Raw lyric text. Lines are separated by `\n` and `**text**` marks bold
    /// spans; see [`crate::lyrics::format_lyrics`].
    pub lyrics: String,
    /// Always within [`FONT_SIZE_RANGE`] once stored.
    pub font_size: u32,
    /// Pixels per second, always within [`SCROLL_SPEED_RANGE`] once stored.
    pub scroll_speed: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Song {
    /// Build a new song from a validated draft.
    pub fn from_draft(id: String, draft: &SongDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name.trim().to_string(),
            author: draft.author.trim().to_string(),
            lyrics: draft.lyrics.clone(),
            font_size: clamp_font_size(draft.font_size),
            scroll_speed: clamp_scroll_speed(draft.scroll_speed),
            created_at: now,
            updated_at: now,
        }
    }

    /// Compose a `Name - Author` string that gracefully omits the hyphen if
    /// the author is blank.
    pub fn display_title(&self) -> String {
        if self.author.trim().is_empty() {
            self.name.clone()
        } else {
            format!("{} - {}", self.name, self.author)
        }
    }

    /// Pull the numeric fields back into range. Stored documents may have
    /// been written by older builds that did not clamp.
    pub fn normalize(&mut self) {
        self.font_size = clamp_font_size(i64::from(self.font_size));
        self.scroll_speed = clamp_scroll_speed(i64::from(self.scroll_speed));
    }
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Editable song fields as entered in the editor, before validation. Numeric
/// fields are signed so out-of-range input can be clamped instead of rejected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SongDraft {
    pub name: String,
    pub author: String,
    pub lyrics: String,
    pub font_size: i64,
    pub scroll_speed: i64,
}

impl SongDraft {
    /// Blank draft seeded with the configured defaults for new songs.
    pub fn with_defaults(settings: &Settings) -> Self {
        Self {
            font_size: i64::from(settings.default_font_size),
            scroll_speed: i64::from(settings.default_scroll_speed),
            ..Self::default()
        }
    }

    pub fn from_song(song: &Song) -> Self {
        Self {
            name: song.name.clone(),
            author: song.author.clone(),
            lyrics: song.lyrics.clone(),
            font_size: i64::from(song.font_size),
            scroll_speed: i64::from(song.scroll_speed),
        }
    }

    /// Both name and author must be non-blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptySongName);
        }
        if self.author.trim().is_empty() {
            return Err(ValidationError::EmptySongAuthor);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// A named, ordered list of song references. Order defines playback order and
/// the same song may appear more than once.
pub struct Setlist {
    pub id: String,
    pub name: String,
    pub song_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Setlist {
    /// An empty setlist cannot be played.
    pub fn is_playable(&self) -> bool {
        !self.song_ids.is_empty()
    }

    /// Song id at `index`, if the index is in bounds.
    pub fn song_at(&self, index: usize) -> Option<&str> {
        self.song_ids.get(index).map(String::as_str)
    }

    /// Whether `index` points at the final entry.
    pub fn is_last(&self, index: usize) -> bool {
        index + 1 >= self.song_ids.len()
    }

    /// Drop every occurrence of `song_id`, returning how many entries went.
    pub fn remove_song(&mut self, song_id: &str) -> usize {
        let before = self.song_ids.len();
        self.song_ids.retain(|id| id != song_id);
        before - self.song_ids.len()
    }
}

impl fmt::Display for Setlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Process-wide preferences. A single instance is stored and overwritten
/// wholesale on save. Missing fields in stored JSON take their defaults.
pub struct Settings {
    /// Font size given to newly created songs.
    pub default_font_size: u32,
    /// Scroll speed given to newly created songs.
    pub default_scroll_speed: u32,
    /// Reader background as `#rrggbb`.
    pub background_color: String,
    /// Reader text color as `#rrggbb`.
    pub font_color: String,
    pub autoplay_enabled: bool,
    /// Seconds before autoplay advances to the next setlist song.
    pub autoplay_delay: u32,
    pub show_timer_in_setlists: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_font_size: 18,
            default_scroll_speed: 50,
            background_color: "#1f2937".to_string(),
            font_color: "#f9fafb".to_string(),
            autoplay_enabled: false,
            autoplay_delay: 3,
            show_timer_in_setlists: false,
        }
    }
}

impl Settings {
    /// Clamp every numeric field into its allowed range.
    pub fn normalized(mut self) -> Self {
        self.default_font_size = clamp_font_size(i64::from(self.default_font_size));
        self.default_scroll_speed = clamp_scroll_speed(i64::from(self.default_scroll_speed));
        self.autoplay_delay = clamp_autoplay_delay(i64::from(self.autoplay_delay));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song() -> Song {
        let draft = SongDraft {
            name: "  Amazing Grace ".to_string(),
            author: "Newton".to_string(),
            lyrics: "**VERSE 1**\nAmazing grace".to_string(),
            font_size: 100,
            scroll_speed: 1,
        };
        Song::from_draft("s1".to_string(), &draft, Utc::now())
    }

    #[test]
    fn clamps_hold_for_extreme_inputs() {
        for value in [i64::MIN, -5, 0, 11, 12, 30, 48, 49, i64::MAX] {
            assert!(FONT_SIZE_RANGE.contains(&clamp_font_size(value)));
            assert!(SCROLL_SPEED_RANGE.contains(&clamp_scroll_speed(value)));
            assert!(AUTOPLAY_DELAY_RANGE.contains(&clamp_autoplay_delay(value)));
        }
        assert_eq!(clamp_font_size(30), 30);
        assert_eq!(clamp_scroll_speed(5), 10);
        assert_eq!(clamp_autoplay_delay(31), 30);
    }

    #[test]
    fn from_draft_trims_and_clamps() {
        let song = song();
        assert_eq!(song.name, "Amazing Grace");
        assert_eq!(song.font_size, 48);
        assert_eq!(song.scroll_speed, 10);
        assert_eq!(song.created_at, song.updated_at);
        assert_eq!(song.display_title(), "Amazing Grace - Newton");
    }

    #[test]
    fn draft_requires_name_and_author() {
        let mut draft = SongDraft::with_defaults(&Settings::default());
        assert_eq!(draft.font_size, 18);
        assert_eq!(draft.scroll_speed, 50);
        assert_eq!(draft.validate(), Err(ValidationError::EmptySongName));
        draft.name = "Title".to_string();
        draft.author = "   ".to_string();
        assert_eq!(draft.validate(), Err(ValidationError::EmptySongAuthor));
        draft.author = "Someone".to_string();
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn setlist_remove_song_drops_duplicates() {
        let now = Utc::now();
        let mut setlist = Setlist {
            id: "l1".to_string(),
            name: "Sunday".to_string(),
            song_ids: vec!["a".into(), "b".into(), "a".into()],
            created_at: now,
            updated_at: now,
        };
        assert_eq!(setlist.remove_song("a"), 2);
        assert_eq!(setlist.song_ids, vec!["b".to_string()]);
        assert_eq!(setlist.remove_song("a"), 0);
        assert!(setlist.is_last(0));
    }

    #[test]
    fn settings_fill_missing_fields_with_defaults() {
        let parsed: Settings =
            serde_json::from_str(r##"{"fontColor":"#000000","autoplayDelay":99}"##).unwrap();
        let parsed = parsed.normalized();
        assert_eq!(parsed.font_color, "#000000");
        assert_eq!(parsed.background_color, "#1f2937");
        assert_eq!(parsed.autoplay_delay, 30);
        assert_eq!(parsed.default_font_size, 18);
    }

    #[test]
    fn song_serializes_with_camel_case_keys() {
        let value = serde_json::to_value(song()).unwrap();
        assert!(value.get("fontSize").is_some());
        assert!(value.get("scrollSpeed").is_some());
        assert!(value.get("createdAt").is_some());
    }
}

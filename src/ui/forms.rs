use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::models::{Setlist, Settings, Song, SongDraft};

/// Section headings offered as one-key inserts in the lyrics field.
pub(crate) const SECTION_SHORTCUTS: [&str; 8] = [
    "VERSE 1",
    "VERSE 2",
    "PRE-CHORUS",
    "CHORUS",
    "BRIDGE",
    "INTRO",
    "OUTRO",
    "VERSE 3",
];

/// Parse a digits-only field. Blank reads as zero and overflow saturates;
/// the model clamps either way.
fn parse_number(raw: &str) -> i64 {
    let raw = raw.trim();
    if raw.is_empty() {
        0
    } else {
        raw.parse::<i64>().unwrap_or(i64::MAX)
    }
}

fn field_style(is_active: bool, is_empty: bool) -> Style {
    if is_active {
        Style::default().fg(Color::Yellow)
    } else if is_empty {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    }
}

fn field_line(label: &str, value: &str, placeholder: &str, is_active: bool) -> Line<'static> {
    let display = if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    };
    Line::from(vec![
        Span::raw(format!("{label}: ")),
        Span::styled(display, field_style(is_active, value.is_empty())),
    ])
}

/// Fields available within the song editor.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum SongField {
    #[default]
    Name,
    Author,
    FontSize,
    ScrollSpeed,
    Lyrics,
}

/// Song editor state. Numeric fields are kept as text while typing and only
/// clamped when the draft is built.
#[derive(Default, Clone)]
pub(crate) struct SongForm {
    pub(crate) name: String,
    pub(crate) author: String,
    pub(crate) font_size: String,
    pub(crate) scroll_speed: String,
    pub(crate) lyrics: String,
    pub(crate) active: SongField,
    pub(crate) error: Option<String>,
}

impl SongForm {
    /// Populate the form from a draft (new song defaults or an existing
    /// song).
    pub(crate) fn from_draft(draft: &SongDraft) -> Self {
        Self {
            name: draft.name.clone(),
            author: draft.author.clone(),
            font_size: draft.font_size.to_string(),
            scroll_speed: draft.scroll_speed.to_string(),
            lyrics: draft.lyrics.clone(),
            active: SongField::Name,
            error: None,
        }
    }

    pub(crate) fn from_song(song: &Song) -> Self {
        Self::from_draft(&SongDraft::from_song(song))
    }

    /// Cycle focus forward through the fields.
    pub(crate) fn next_field(&mut self) {
        self.active = match self.active {
            SongField::Name => SongField::Author,
            SongField::Author => SongField::FontSize,
            SongField::FontSize => SongField::ScrollSpeed,
            SongField::ScrollSpeed => SongField::Lyrics,
            SongField::Lyrics => SongField::Name,
        };
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = match self.active {
            SongField::Name => SongField::Lyrics,
            SongField::Author => SongField::Name,
            SongField::FontSize => SongField::Author,
            SongField::ScrollSpeed => SongField::FontSize,
            SongField::Lyrics => SongField::ScrollSpeed,
        };
    }

    /// Insert a character into the active field. Numeric fields accept digits
    /// only.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.active {
            SongField::FontSize | SongField::ScrollSpeed if !ch.is_ascii_digit() => false,
            SongField::Lyrics if ch == '\n' => {
                self.lyrics.push(ch);
                true
            }
            _ if ch.is_control() => false,
            SongField::Name => {
                self.name.push(ch);
                true
            }
            SongField::Author => {
                self.author.push(ch);
                true
            }
            SongField::FontSize => {
                self.font_size.push(ch);
                true
            }
            SongField::ScrollSpeed => {
                self.scroll_speed.push(ch);
                true
            }
            SongField::Lyrics => {
                self.lyrics.push(ch);
                true
            }
        }
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            SongField::Name => self.name.pop(),
            SongField::Author => self.author.pop(),
            SongField::FontSize => self.font_size.pop(),
            SongField::ScrollSpeed => self.scroll_speed.pop(),
            SongField::Lyrics => self.lyrics.pop(),
        };
    }

    /// Append a bold section heading on its own line to the lyrics.
    pub(crate) fn insert_section(&mut self, label: &str) {
        if !self.lyrics.is_empty() && !self.lyrics.ends_with('\n') {
            self.lyrics.push('\n');
        }
        self.lyrics.push_str(&format!("**{label}**\n"));
        self.active = SongField::Lyrics;
    }

    /// Build the draft handed to the library. Validation happens there.
    pub(crate) fn to_draft(&self) -> SongDraft {
        SongDraft {
            name: self.name.clone(),
            author: self.author.clone(),
            lyrics: self.lyrics.clone(),
            font_size: parse_number(&self.font_size),
            scroll_speed: parse_number(&self.scroll_speed),
        }
    }

    pub(crate) fn build_line(&self, field: SongField) -> Line<'static> {
        let is_active = self.active == field;
        match field {
            SongField::Name => field_line("Name", &self.name, "<required>", is_active),
            SongField::Author => field_line("Author", &self.author, "<required>", is_active),
            SongField::FontSize => field_line("Font size", &self.font_size, "12-48", is_active),
            SongField::ScrollSpeed => {
                field_line("Scroll speed", &self.scroll_speed, "10-200 px/s", is_active)
            }
            SongField::Lyrics => {
                let count = self.lyrics.lines().count();
                field_line("Lyrics", &format!("{count} lines"), "", is_active)
            }
        }
    }

    /// Label width and current value length, for cursor placement on
    /// single-line fields.
    pub(crate) fn cursor_offset(&self) -> Option<(usize, u16)> {
        let (label, value, row) = match self.active {
            SongField::Name => ("Name: ", &self.name, 0),
            SongField::Author => ("Author: ", &self.author, 1),
            SongField::FontSize => ("Font size: ", &self.font_size, 2),
            SongField::ScrollSpeed => ("Scroll speed: ", &self.scroll_speed, 3),
            SongField::Lyrics => return None,
        };
        Some((label.len() + value.chars().count(), row))
    }
}

/// Focus areas of the setlist editor.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum SetlistField {
    #[default]
    Name,
    /// Picker over every song in the library.
    Songs,
    /// Ordered entries of the setlist being edited.
    Order,
}

/// Setlist editor: a name plus an ordered selection of song ids.
#[derive(Default, Clone)]
pub(crate) struct SetlistForm {
    pub(crate) name: String,
    pub(crate) selected: Vec<String>,
    pub(crate) active: SetlistField,
    pub(crate) song_cursor: usize,
    pub(crate) order_cursor: usize,
    pub(crate) error: Option<String>,
}

impl SetlistForm {
    pub(crate) fn from_setlist(setlist: &Setlist) -> Self {
        Self {
            name: setlist.name.clone(),
            selected: setlist.song_ids.clone(),
            ..Self::default()
        }
    }

    pub(crate) fn next_field(&mut self) {
        self.active = match self.active {
            SetlistField::Name => SetlistField::Songs,
            SetlistField::Songs => SetlistField::Order,
            SetlistField::Order => SetlistField::Name,
        };
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = match self.active {
            SetlistField::Name => SetlistField::Order,
            SetlistField::Songs => SetlistField::Name,
            SetlistField::Order => SetlistField::Songs,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if self.active == SetlistField::Name && !ch.is_control() {
            self.name.push(ch);
            true
        } else {
            false
        }
    }

    pub(crate) fn backspace(&mut self) {
        if self.active == SetlistField::Name {
            self.name.pop();
        }
    }

    /// Add the song when absent, otherwise remove every occurrence.
    pub(crate) fn toggle_song(&mut self, song_id: &str) {
        if self.selected.iter().any(|id| id == song_id) {
            self.selected.retain(|id| id != song_id);
        } else {
            self.selected.push(song_id.to_string());
        }
        self.clamp_order_cursor();
    }

    pub(crate) fn is_selected(&self, song_id: &str) -> bool {
        self.selected.iter().any(|id| id == song_id)
    }

    /// 1-based position of a song in the running order, if selected.
    pub(crate) fn position_of(&self, song_id: &str) -> Option<usize> {
        self.selected
            .iter()
            .position(|id| id == song_id)
            .map(|idx| idx + 1)
    }

    /// Move the entry under the order cursor one place up (`-1`) or down
    /// (`1`), keeping the cursor on it.
    pub(crate) fn move_entry(&mut self, offset: isize) {
        let from = self.order_cursor;
        let Some(to) = from.checked_add_signed(offset) else {
            return;
        };
        if from >= self.selected.len() || to >= self.selected.len() {
            return;
        }
        let entry = self.selected.remove(from);
        self.selected.insert(to, entry);
        self.order_cursor = to;
    }

    /// Drop the entry under the order cursor.
    pub(crate) fn remove_entry(&mut self) {
        if self.order_cursor < self.selected.len() {
            self.selected.remove(self.order_cursor);
            self.clamp_order_cursor();
        }
    }

    pub(crate) fn move_cursor(&mut self, offset: isize, song_count: usize) {
        let (cursor, len) = match self.active {
            SetlistField::Name => return,
            SetlistField::Songs => (&mut self.song_cursor, song_count),
            SetlistField::Order => (&mut self.order_cursor, self.selected.len()),
        };
        if len == 0 {
            *cursor = 0;
            return;
        }
        *cursor = cursor.saturating_add_signed(offset).min(len - 1);
    }

    fn clamp_order_cursor(&mut self) {
        if self.order_cursor >= self.selected.len() {
            self.order_cursor = self.selected.len().saturating_sub(1);
        }
    }

    pub(crate) fn name_line(&self) -> Line<'static> {
        field_line(
            "Name",
            &self.name,
            "<required>",
            self.active == SetlistField::Name,
        )
    }
}

/// Fields of the settings screen.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum SettingsField {
    #[default]
    DefaultFontSize,
    DefaultScrollSpeed,
    BackgroundColor,
    FontColor,
    AutoplayEnabled,
    AutoplayDelay,
    ShowTimer,
}

const SETTINGS_FIELDS: [SettingsField; 7] = [
    SettingsField::DefaultFontSize,
    SettingsField::DefaultScrollSpeed,
    SettingsField::BackgroundColor,
    SettingsField::FontColor,
    SettingsField::AutoplayEnabled,
    SettingsField::AutoplayDelay,
    SettingsField::ShowTimer,
];

/// Local copy of the settings being edited. Nothing is stored until saved.
#[derive(Clone)]
pub(crate) struct SettingsForm {
    pub(crate) default_font_size: String,
    pub(crate) default_scroll_speed: String,
    pub(crate) background_color: String,
    pub(crate) font_color: String,
    pub(crate) autoplay_enabled: bool,
    pub(crate) autoplay_delay: String,
    pub(crate) show_timer: bool,
    pub(crate) active: SettingsField,
}

impl SettingsForm {
    pub(crate) fn from_settings(settings: &Settings) -> Self {
        Self {
            default_font_size: settings.default_font_size.to_string(),
            default_scroll_speed: settings.default_scroll_speed.to_string(),
            background_color: settings.background_color.clone(),
            font_color: settings.font_color.clone(),
            autoplay_enabled: settings.autoplay_enabled,
            autoplay_delay: settings.autoplay_delay.to_string(),
            show_timer: settings.show_timer_in_setlists,
            active: SettingsField::DefaultFontSize,
        }
    }

    fn active_index(&self) -> usize {
        SETTINGS_FIELDS
            .iter()
            .position(|field| *field == self.active)
            .unwrap_or(0)
    }

    pub(crate) fn move_focus(&mut self, offset: isize) {
        let len = SETTINGS_FIELDS.len() as isize;
        let idx = (self.active_index() as isize + offset).rem_euclid(len);
        self.active = SETTINGS_FIELDS[idx as usize];
    }

    /// Flip the focused toggle. Returns `false` on text fields.
    pub(crate) fn toggle(&mut self) -> bool {
        match self.active {
            SettingsField::AutoplayEnabled => self.autoplay_enabled = !self.autoplay_enabled,
            SettingsField::ShowTimer => self.show_timer = !self.show_timer,
            _ => return false,
        }
        true
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        let target = match self.active {
            SettingsField::DefaultFontSize => &mut self.default_font_size,
            SettingsField::DefaultScrollSpeed => &mut self.default_scroll_speed,
            SettingsField::AutoplayDelay => &mut self.autoplay_delay,
            SettingsField::BackgroundColor => &mut self.background_color,
            SettingsField::FontColor => &mut self.font_color,
            SettingsField::AutoplayEnabled | SettingsField::ShowTimer => return false,
        };
        let accepted = match self.active {
            SettingsField::BackgroundColor | SettingsField::FontColor => {
                ch == '#' || ch.is_ascii_hexdigit()
            }
            _ => ch.is_ascii_digit(),
        };
        if accepted {
            target.push(ch);
        }
        accepted
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            SettingsField::DefaultFontSize => self.default_font_size.pop(),
            SettingsField::DefaultScrollSpeed => self.default_scroll_speed.pop(),
            SettingsField::BackgroundColor => self.background_color.pop(),
            SettingsField::FontColor => self.font_color.pop(),
            SettingsField::AutoplayDelay => self.autoplay_delay.pop(),
            SettingsField::AutoplayEnabled | SettingsField::ShowTimer => None,
        };
    }

    /// Settings as typed; the library clamps numbers on save.
    pub(crate) fn to_settings(&self) -> Settings {
        let clamp_u32 = |raw: &str| u32::try_from(parse_number(raw)).unwrap_or(u32::MAX);
        Settings {
            default_font_size: clamp_u32(&self.default_font_size),
            default_scroll_speed: clamp_u32(&self.default_scroll_speed),
            background_color: self.background_color.trim().to_string(),
            font_color: self.font_color.trim().to_string(),
            autoplay_enabled: self.autoplay_enabled,
            autoplay_delay: clamp_u32(&self.autoplay_delay),
            show_timer_in_setlists: self.show_timer,
        }
    }

    pub(crate) fn build_lines(&self) -> Vec<Line<'static>> {
        let check = |on: bool| if on { "[x]" } else { "[ ]" };
        SETTINGS_FIELDS
            .iter()
            .map(|field| {
                let is_active = *field == self.active;
                match field {
                    SettingsField::DefaultFontSize => field_line(
                        "Default font size (12-48)",
                        &self.default_font_size,
                        "",
                        is_active,
                    ),
                    SettingsField::DefaultScrollSpeed => field_line(
                        "Default scroll speed (10-200 px/s)",
                        &self.default_scroll_speed,
                        "",
                        is_active,
                    ),
                    SettingsField::BackgroundColor => {
                        field_line("Background color", &self.background_color, "#rrggbb", is_active)
                    }
                    SettingsField::FontColor => {
                        field_line("Font color", &self.font_color, "#rrggbb", is_active)
                    }
                    SettingsField::AutoplayEnabled => {
                        toggle_line("Autoplay in setlists", check(self.autoplay_enabled), is_active)
                    }
                    SettingsField::AutoplayDelay => field_line(
                        "Autoplay delay (1-30 s)",
                        &self.autoplay_delay,
                        "",
                        is_active,
                    ),
                    SettingsField::ShowTimer => {
                        toggle_line("Show timer in setlists", check(self.show_timer), is_active)
                    }
                }
            })
            .collect()
    }
}

fn toggle_line(label: &str, mark: &str, is_active: bool) -> Line<'static> {
    let style = if is_active {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::styled(mark.to_string(), style),
        Span::raw(format!(" {label}")),
    ])
}

/// State for confirming permanent song deletion.
pub(crate) struct ConfirmSongDelete {
    pub(crate) song: Song,
    /// Number of setlists that reference the song.
    pub(crate) setlist_count: usize,
}

/// State for confirming setlist deletion.
pub(crate) struct ConfirmSetlistDelete {
    pub(crate) setlist: Setlist,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn song_form_numeric_fields_take_digits_only() {
        let mut form = SongForm::from_draft(&SongDraft::with_defaults(&Settings::default()));
        form.active = SongField::FontSize;
        assert!(!form.push_char('x'));
        form.backspace();
        form.backspace();
        assert!(form.push_char('9'));
        assert!(form.push_char('9'));
        let draft = form.to_draft();
        assert_eq!(draft.font_size, 99);
        assert_eq!(draft.scroll_speed, 50);
    }

    #[test]
    fn song_form_lyrics_accept_newlines_and_sections() {
        let mut form = SongForm::default();
        form.active = SongField::Lyrics;
        for ch in "hello".chars() {
            form.push_char(ch);
        }
        form.insert_section("CHORUS");
        form.push_char('x');
        assert_eq!(form.lyrics, "hello\n**CHORUS**\nx");
    }

    #[test]
    fn setlist_form_toggle_and_reorder() {
        let mut form = SetlistForm::default();
        form.toggle_song("a");
        form.toggle_song("b");
        form.toggle_song("c");
        assert_eq!(form.position_of("b"), Some(2));

        form.active = SetlistField::Order;
        form.order_cursor = 2;
        form.move_entry(-1);
        assert_eq!(form.selected, vec!["a", "c", "b"]);
        assert_eq!(form.order_cursor, 1);
        form.move_entry(-5);
        assert_eq!(form.selected, vec!["a", "c", "b"]);

        form.toggle_song("a");
        assert_eq!(form.selected, vec!["c", "b"]);
        form.order_cursor = 1;
        form.remove_entry();
        assert_eq!(form.selected, vec!["c"]);
        assert_eq!(form.order_cursor, 0);
    }

    #[test]
    fn settings_form_round_trips_values() {
        let mut form = SettingsForm::from_settings(&Settings::default());
        form.active = SettingsField::AutoplayEnabled;
        assert!(form.toggle());
        form.move_focus(1);
        assert!(form.active == SettingsField::AutoplayDelay);
        form.backspace();
        form.push_char('7');
        form.move_focus(-2);
        assert!(form.active == SettingsField::FontColor);
        assert!(!form.push_char('z'));
        let settings = form.to_settings();
        assert!(settings.autoplay_enabled);
        assert_eq!(settings.autoplay_delay, 7);
        assert_eq!(settings.font_color, "#f9fafb");
    }
}

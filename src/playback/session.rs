//! Which song is on stage and how we got there. Every transition is a pure
//! function returning a new [`PlaybackSession`]; the orchestrator swaps the
//! value in and reacts to the difference.

use crate::models::{Setlist, Settings};

/// Position inside a setlist. `index` always points at a valid entry of the
/// setlist it was created from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetlistCursor {
    pub setlist_id: String,
    pub index: usize,
}

/// Screen to return to when the reader closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnView {
    Songs,
    Setlists,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackSession {
    pub song_id: Option<String>,
    pub cursor: Option<SetlistCursor>,
    pub autoplay_active: bool,
    pub show_timer: bool,
}

impl PlaybackSession {
    /// Play a single song outside any setlist.
    pub fn for_song(song_id: &str) -> Self {
        Self {
            song_id: Some(song_id.to_string()),
            ..Self::default()
        }
    }

    /// Start a setlist at its first entry. Empty setlists cannot be played.
    pub fn for_setlist(setlist: &Setlist, settings: &Settings) -> Option<Self> {
        let first = setlist.song_at(0)?;
        Some(Self {
            song_id: Some(first.to_string()),
            cursor: Some(SetlistCursor {
                setlist_id: setlist.id.clone(),
                index: 0,
            }),
            autoplay_active: settings.autoplay_enabled,
            show_timer: settings.show_timer_in_setlists,
        })
    }

    pub fn is_open(&self) -> bool {
        self.song_id.is_some()
    }

    fn move_to(&self, setlist: &Setlist, index: usize) -> Self {
        match (self.cursor.as_ref(), setlist.song_at(index)) {
            (Some(cursor), Some(song_id)) if cursor.setlist_id == setlist.id => Self {
                song_id: Some(song_id.to_string()),
                cursor: Some(SetlistCursor {
                    setlist_id: cursor.setlist_id.clone(),
                    index,
                }),
                ..self.clone()
            },
            _ => self.clone(),
        }
    }

    /// Step forward one entry. Stays put on the last entry or outside a
    /// setlist.
    pub fn next(&self, setlist: &Setlist) -> Self {
        match &self.cursor {
            Some(cursor) => self.move_to(setlist, cursor.index + 1),
            None => self.clone(),
        }
    }

    /// Step back one entry. Stays put on the first entry.
    pub fn previous(&self, setlist: &Setlist) -> Self {
        match &self.cursor {
            Some(cursor) if cursor.index > 0 => self.move_to(setlist, cursor.index - 1),
            _ => self.clone(),
        }
    }

    /// Autoplay step: move to the next entry, or switch autoplay off when the
    /// current entry is the last one.
    pub fn advance_autoplay(&self, setlist: &Setlist) -> Self {
        if !self.has_next(setlist) {
            return self.with_autoplay(false);
        }
        self.next(setlist)
    }

    pub fn with_autoplay(&self, active: bool) -> Self {
        Self {
            autoplay_active: active,
            ..self.clone()
        }
    }

    pub fn has_next(&self, setlist: &Setlist) -> bool {
        self.cursor
            .as_ref()
            .is_some_and(|cursor| !setlist.is_last(cursor.index))
    }

    pub fn has_previous(&self) -> bool {
        self.cursor.as_ref().is_some_and(|cursor| cursor.index > 0)
    }

    /// Leave the reader. The session is emptied and the caller learns which
    /// list to show.
    pub fn closed(&self) -> (Self, ReturnView) {
        let view = if self.cursor.is_some() {
            ReturnView::Setlists
        } else {
            ReturnView::Songs
        };
        (Self::default(), view)
    }
}

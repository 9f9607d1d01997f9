//! In-memory song and setlist collections plus the editing operations the
//! front-end screens perform on them. Nothing here touches storage; callers
//! persist the collections through [`crate::db`] after a successful change.

use chrono::{DateTime, Utc};
use log::{debug, info};
use uuid::Uuid;

use crate::models::{
    clamp_font_size, clamp_scroll_speed, Setlist, Settings, Song, SongDraft, ValidationError,
};

/// Everything the application knows about: songs, setlists and settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Library {
    pub songs: Vec<Song>,
    pub setlists: Vec<Setlist>,
    pub settings: Settings,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl Library {
    pub fn new(songs: Vec<Song>, setlists: Vec<Setlist>, settings: Settings) -> Self {
        Self {
            songs,
            setlists,
            settings,
        }
    }

    pub fn song(&self, id: &str) -> Option<&Song> {
        self.songs.iter().find(|song| song.id == id)
    }

    pub fn setlist(&self, id: &str) -> Option<&Setlist> {
        self.setlists.iter().find(|setlist| setlist.id == id)
    }

    /// Resolve a setlist's entries to songs, skipping ids that no longer
    /// exist.
    pub fn setlist_songs<'a>(&'a self, setlist: &'a Setlist) -> impl Iterator<Item = &'a Song> {
        setlist.song_ids.iter().filter_map(|id| self.song(id))
    }

    /// Validate a draft and append a new song.
    pub fn create_song(&mut self, draft: &SongDraft) -> Result<&Song, ValidationError> {
        self.create_song_at(draft, Utc::now())
    }

    pub fn create_song_at(
        &mut self,
        draft: &SongDraft,
        now: DateTime<Utc>,
    ) -> Result<&Song, ValidationError> {
        draft.validate()?;
        let song = Song::from_draft(new_id(), draft, now);
        info!("created song {} ({})", song.id, song.display_title());
        self.songs.push(song);
        Ok(&self.songs[self.songs.len() - 1])
    }

    /// Replace the editable fields of an existing song, keeping its id and
    /// creation time.
    pub fn update_song(&mut self, id: &str, draft: &SongDraft) -> Result<&Song, ValidationError> {
        draft.validate()?;
        let song = self
            .songs
            .iter_mut()
            .find(|song| song.id == id)
            .ok_or_else(|| ValidationError::SongNotFound(id.to_string()))?;
        let refreshed = Song::from_draft(song.id.clone(), draft, Utc::now());
        *song = Song {
            created_at: song.created_at,
            ..refreshed
        };
        info!("updated song {}", song.id);
        Ok(&*song)
    }

    /// Store a song handed back by the reader after a font size or scroll
    /// speed change. Unknown ids are ignored.
    pub fn apply_song_update(&mut self, updated: &Song) -> bool {
        match self.songs.iter_mut().find(|song| song.id == updated.id) {
            Some(song) => {
                *song = updated.clone();
                song.font_size = clamp_font_size(i64::from(song.font_size));
                song.scroll_speed = clamp_scroll_speed(i64::from(song.scroll_speed));
                debug!(
                    "song {} now font {} speed {}",
                    song.id, song.font_size, song.scroll_speed
                );
                true
            }
            None => false,
        }
    }

    /// Remove a song and every reference to it from all setlists. Returns
    /// `false` when the song was already gone, which makes repeat calls
    /// no-ops.
    pub fn delete_song(&mut self, id: &str) -> bool {
        let before = self.songs.len();
        self.songs.retain(|song| song.id != id);
        let removed = self.songs.len() != before;

        let mut references = 0;
        for setlist in &mut self.setlists {
            references += setlist.remove_song(id);
        }
        if removed || references > 0 {
            info!("deleted song {id}, dropped {references} setlist entries");
        }
        removed
    }

    pub fn create_setlist(
        &mut self,
        name: &str,
        song_ids: Vec<String>,
    ) -> Result<&Setlist, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptySetlistName);
        }
        let now = Utc::now();
        let setlist = Setlist {
            id: new_id(),
            name: name.to_string(),
            song_ids,
            created_at: now,
            updated_at: now,
        };
        info!("created setlist {} ({})", setlist.id, setlist.name);
        self.setlists.push(setlist);
        Ok(&self.setlists[self.setlists.len() - 1])
    }

    pub fn update_setlist(
        &mut self,
        id: &str,
        name: &str,
        song_ids: Vec<String>,
    ) -> Result<&Setlist, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptySetlistName);
        }
        let setlist = self
            .setlists
            .iter_mut()
            .find(|setlist| setlist.id == id)
            .ok_or_else(|| ValidationError::SetlistNotFound(id.to_string()))?;
        setlist.name = name.to_string();
        setlist.song_ids = song_ids;
        setlist.updated_at = Utc::now();
        info!("updated setlist {}", setlist.id);
        Ok(&*setlist)
    }

    pub fn delete_setlist(&mut self, id: &str) -> bool {
        let before = self.setlists.len();
        self.setlists.retain(|setlist| setlist.id != id);
        let removed = self.setlists.len() != before;
        if removed {
            info!("deleted setlist {id}");
        }
        removed
    }

    /// Overwrite settings wholesale, clamping numeric fields.
    pub fn replace_settings(&mut self, settings: Settings) {
        self.settings = settings.normalized();
        info!("settings replaced");
    }

    pub fn reset_settings(&mut self) {
        self.replace_settings(Settings::default());
    }

    /// Draft for the "new song" editor, seeded with the configured defaults.
    pub fn new_song_draft(&self) -> SongDraft {
        SongDraft::with_defaults(&self.settings)
    }
}

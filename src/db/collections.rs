use anyhow::{Context, Result};
use log::debug;
use rusqlite::Connection;

use crate::library::Library;
use crate::models::{Setlist, Settings, Song};

use super::store::{get, set};

/// Storage key for the song array.
pub const SONGS_KEY: &str = "songs";
/// Storage key for the setlist array.
pub const SETLISTS_KEY: &str = "setlists";
/// Storage key for the settings object.
pub const SETTINGS_KEY: &str = "settings";

/// Load every song in stored order, clamping numeric fields written by older
/// builds.
pub fn fetch_songs(conn: &Connection) -> Result<Vec<Song>> {
    let mut songs: Vec<Song> = get(conn, SONGS_KEY, Vec::new()).context("failed to load songs")?;
    songs.iter_mut().for_each(Song::normalize);
    Ok(songs)
}

pub fn save_songs(conn: &Connection, songs: &[Song]) -> Result<()> {
    debug!("saving {} songs", songs.len());
    set(conn, SONGS_KEY, &songs).context("failed to save songs")
}

pub fn fetch_setlists(conn: &Connection) -> Result<Vec<Setlist>> {
    get(conn, SETLISTS_KEY, Vec::new()).context("failed to load setlists")
}

pub fn save_setlists(conn: &Connection, setlists: &[Setlist]) -> Result<()> {
    debug!("saving {} setlists", setlists.len());
    set(conn, SETLISTS_KEY, &setlists).context("failed to save setlists")
}

/// Stored settings, or defaults on first run.
pub fn fetch_settings(conn: &Connection) -> Result<Settings> {
    let settings: Settings =
        get(conn, SETTINGS_KEY, Settings::default()).context("failed to load settings")?;
    Ok(settings.normalized())
}

pub fn save_settings(conn: &Connection, settings: &Settings) -> Result<()> {
    set(conn, SETTINGS_KEY, settings).context("failed to save settings")
}

/// Hydrate the whole library in one go.
pub fn load_library(conn: &Connection) -> Result<Library> {
    Ok(Library::new(
        fetch_songs(conn)?,
        fetch_setlists(conn)?,
        fetch_settings(conn)?,
    ))
}

/// Persist every collection. Used after cascading edits that touch both songs
/// and setlists.
pub fn save_library(conn: &Connection, library: &Library) -> Result<()> {
    save_songs(conn, &library.songs)?;
    save_setlists(conn, &library.setlists)?;
    save_settings(conn, &library.settings)
}

//! Persistence module: a JSON key/value table in SQLite plus typed helpers
//! for the three stored collections.

mod collections;
mod connection;
mod store;

pub use collections::{
    fetch_setlists, fetch_settings, fetch_songs, load_library, save_library, save_setlists,
    save_settings, save_songs, SETLISTS_KEY, SETTINGS_KEY, SONGS_KEY,
};
pub use connection::{default_db_path, default_log_path, ensure_schema, open_in_memory};
pub use store::{get, load_value, revive_timestamps, save_value, set};

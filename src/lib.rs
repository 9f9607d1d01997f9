//! Core library surface for the LyricsFlow terminal lyrics reader.
//!
//! Songs with lyrics live in a local key/value store, get grouped into ordered
//! setlists, and are shown in an auto-scrolling reader with per-song font size
//! and scroll speed, optional setlist timer and autoplay.
pub mod config;
pub mod db;
pub mod library;
pub mod lyrics;
pub mod models;
pub mod playback;
pub mod ui;

/// Persistence entry points used by `main.rs` to open the store and hydrate
/// the library.
pub use db::{ensure_schema, load_library, save_library};

pub use library::Library;
pub use lyrics::{format_lyrics, LyricLine, Run};
pub use models::{Setlist, Settings, Song, SongDraft, ValidationError};
pub use playback::{Performance, PlaybackSession, Reader};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};

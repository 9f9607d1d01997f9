//! Ratatui front-end for LyricsFlow: song and setlist lists with their
//! editors, the settings form, and the full-screen auto-scrolling reader.
//!
//! Screens and modal forms follow the same pattern: the current mode is
//! taken out of the app, handed the key, and the returned mode is put back.
//! Every successful edit is written to the store right away.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;

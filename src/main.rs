//! Binary entry point: parse configuration, start logging, open the store,
//! hydrate the library and drive the Ratatui event loop until the user exits.
use clap::Parser;
use log::info;
use lyricsflow::config::{init_logging, Cli};
use lyricsflow::{ensure_schema, load_library, run_app, App};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_path()?)?;

    let conn = ensure_schema(&cli.database_path()?)?;
    let library = load_library(&conn)?;
    info!(
        "loaded {} songs and {} setlists",
        library.songs.len(),
        library.setlists.len()
    );

    let mut app = App::new(conn, library);
    run_app(&mut app)
}

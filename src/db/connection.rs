use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use log::info;
use rusqlite::Connection;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".lyricsflow";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "lyricsflow.sqlite";
/// Log file name stored next to the database.
const LOG_FILE_NAME: &str = "lyricsflow.log";

const CREATE_STORAGE_TABLE: &str = "CREATE TABLE IF NOT EXISTS storage (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
)";

/// Open (creating if needed) the key/value store at `path` and make sure the
/// schema exists. Safe to call on an already initialised file.
pub fn ensure_schema(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("failed to create data directory")?;
        }
    }

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database at {}", path.display()))?;
    conn.execute(CREATE_STORAGE_TABLE, [])
        .context("failed to create storage table")?;
    info!("opened store at {}", path.display());
    Ok(conn)
}

/// Fresh in-memory store, used by tests and throwaway sessions.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    conn.execute(CREATE_STORAGE_TABLE, [])
        .context("failed to create storage table")?;
    Ok(conn)
}

fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

/// Resolve the default database path inside the user's home.
pub fn default_db_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(DB_FILE_NAME))
}

/// Resolve the default log file path inside the user's home.
pub fn default_log_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(LOG_FILE_NAME))
}

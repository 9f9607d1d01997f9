//! Command-line and environment configuration.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use crate::db::{default_db_path, default_log_path};

/// Terminal lyrics reader with setlists and auto-scroll.
#[derive(Debug, Clone, Parser)]
#[command(name = "lyricsflow", version, about)]
pub struct Cli {
    /// SQLite file holding songs, setlists and settings.
    #[arg(long, env = "LYRICSFLOW_DATABASE")]
    pub database: Option<PathBuf>,

    /// File receiving log output. Filter with RUST_LOG.
    #[arg(long, env = "LYRICSFLOW_LOG")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database {
            Some(path) => Ok(path.clone()),
            None => default_db_path(),
        }
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        match &self.log_file {
            Some(path) => Ok(path.clone()),
            None => default_log_path(),
        }
    }
}

/// Route `log` output to `path`. The terminal is in raw mode while the app
/// runs, so nothing may be written to stderr.
pub fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("failed to create log directory")?;
        }
    }
    let file: File = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("failed to initialise logger")
}

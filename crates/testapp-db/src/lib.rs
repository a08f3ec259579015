pub mod error;
pub mod migrations;
pub mod models;
pub mod queries;

pub use error::{Result, StoreError};

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::info;

/// Local account store backed by a single SQLite file.
///
/// No connection is held between calls: every operation opens the file,
/// runs inside its own connection and drops it on return.
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Opens (creating if needed) the store at `path` and brings the schema up
    /// to date. Safe to call on an existing file.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Self {
            path: path.to_path_buf(),
        };
        db.initialize()?;
        Ok(db)
    }

    /// Creates the parent directory and both tables if absent, then records
    /// the running version in `app_settings`.
    pub fn initialize(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        self.with_conn(|conn| migrations::run(conn))?;

        info!("Database initialized at {}", self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = Connection::open(&self.path)?;
        f(&mut conn)
    }
}

use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};

use testapp_types::AppConfig;
use tracing::{error, info, warn};

/// Copies the live database to a single fixed backup slot and back.
///
/// Only one backup exists at a time; each `backup` overwrites the last.
/// Both operations report failure as `false` after logging the cause.
#[derive(Debug, Clone)]
pub struct BackupManager {
    live_path: PathBuf,
    backup_path: PathBuf,
}

impl BackupManager {
    pub fn new(live_path: PathBuf, backup_path: PathBuf) -> Self {
        Self {
            live_path,
            backup_path,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.db_path(), config.backup_path())
    }

    pub fn live_path(&self) -> &Path {
        &self.live_path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Succeeds without copying anything when there is no live file yet.
    pub fn backup(&self) -> bool {
        match self.try_backup() {
            Ok(true) => {
                info!("Database backed up to {}", self.backup_path.display());
                true
            }
            Ok(false) => {
                info!("No database found to backup at {}", self.live_path.display());
                true
            }
            Err(e) => {
                error!("Backup failed: {}", e);
                false
            }
        }
    }

    /// Succeeds without touching the live file when no backup exists.
    pub fn restore(&self) -> bool {
        match self.try_restore() {
            Ok(true) => {
                info!("Database restored from {}", self.backup_path.display());
                true
            }
            Ok(false) => {
                info!("No backup found to restore");
                true
            }
            Err(e) => {
                error!("Restore failed: {}", e);
                false
            }
        }
    }

    fn try_backup(&self) -> io::Result<bool> {
        if let Some(dir) = self.backup_path.parent() {
            fs::create_dir_all(dir)?;
        }
        if !self.live_path.exists() {
            return Ok(false);
        }
        copy_preserving_times(&self.live_path, &self.backup_path)?;
        Ok(true)
    }

    fn try_restore(&self) -> io::Result<bool> {
        if !self.backup_path.exists() {
            return Ok(false);
        }
        if let Some(dir) = self.live_path.parent() {
            fs::create_dir_all(dir)?;
        }
        copy_preserving_times(&self.backup_path, &self.live_path)?;
        Ok(true)
    }
}

/// `fs::copy` carries permissions over, so a read-only source leaves a
/// read-only copy behind; that copy is removed before it is overwritten.
/// Times are applied through a read handle and only warned about on failure.
fn copy_preserving_times(src: &Path, dst: &Path) -> io::Result<()> {
    if let Ok(meta) = fs::metadata(dst) {
        if meta.permissions().readonly() {
            fs::remove_file(dst)?;
        }
    }
    fs::copy(src, dst)?;

    if let Err(e) = copy_times(src, dst) {
        warn!("Could not preserve timestamps on {}: {}", dst.display(), e);
    }
    Ok(())
}

fn copy_times(src: &Path, dst: &Path) -> io::Result<()> {
    let meta = fs::metadata(src)?;
    let times = FileTimes::new()
        .set_accessed(meta.accessed()?)
        .set_modified(meta.modified()?);
    File::open(dst)?.set_times(times)
}

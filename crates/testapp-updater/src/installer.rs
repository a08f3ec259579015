use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::Client;
use testapp_types::config::{ARCHIVE_SUFFIX, INSTALL_SCRIPT_NAME};
use testapp_types::{AppConfig, ReleaseDescriptor};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::backup::BackupManager;
use crate::error::UpdateError;

/// Step the installer is about to start. Reported so the user can see
/// progress while the worker runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStage {
    BackingUp,
    Downloading,
    Extracting,
    Installing,
    Restoring,
}

/// What a finished run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub version: String,
    /// `None` when the package carried no install script and the install
    /// step was skipped.
    pub install_script: Option<PathBuf>,
    /// `false` when the post-install restore failed; the backup is still on
    /// disk in that case.
    pub restored: bool,
}

/// Applies a release: backup, download, extract, install, restore.
///
/// Strictly sequential with no retries. Any failure after the backup leaves
/// the backup file in place; an install failure does not trigger a restore.
pub struct Installer {
    client: Client,
    config: AppConfig,
    backups: BackupManager,
}

impl Installer {
    pub fn new(client: Client, config: AppConfig) -> Self {
        let backups = BackupManager::from_config(&config);
        Self {
            client,
            config,
            backups,
        }
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    pub async fn run<F>(
        &self,
        release: &ReleaseDescriptor,
        on_stage: F,
    ) -> Result<InstallReport, UpdateError>
    where
        F: Fn(UpdateStage) + Send + Sync,
    {
        let version = release.latest_version().to_string();

        on_stage(UpdateStage::BackingUp);
        if !self.backups.backup() {
            return Err(UpdateError::Backup);
        }

        let asset = release
            .find_asset(ARCHIVE_SUFFIX)
            .ok_or(UpdateError::NoPackage)?;

        on_stage(UpdateStage::Downloading);
        let archive = self.config.download_path(&version);
        self.download(&asset.download_url, &archive).await?;

        on_stage(UpdateStage::Extracting);
        let extract_dir = self.config.extract_dir();
        extract(&archive, &extract_dir).await?;

        let install_script = find_install_script(&extract_dir);
        match &install_script {
            Some(script) => {
                on_stage(UpdateStage::Installing);
                self.install(script).await?;
            }
            None => warn!(
                "No {} in the update package, skipping install",
                INSTALL_SCRIPT_NAME
            ),
        }

        on_stage(UpdateStage::Restoring);
        tokio::time::sleep(self.config.restore_delay).await;
        let restored = self.backups.restore();
        if !restored {
            warn!(
                "Update installed but user data was not restored; backup left at {}",
                self.backups.backup_path().display()
            );
        }

        info!("Update to {} complete", version);
        Ok(InstallReport {
            version,
            install_script,
            restored,
        })
    }

    /// Streams `url` to `dest`. A partially written file is left behind on
    /// failure.
    async fn download(&self, url: &str, dest: &Path) -> Result<(), UpdateError> {
        info!("Downloading update from {}", url);

        if let Some(dir) = dest.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| UpdateError::Download(format!("cannot create {}: {}", dir.display(), e)))?;
        }

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpdateError::Download(format!("request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(UpdateError::Download(format!("server returned {}", resp.status())));
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| UpdateError::Download(format!("cannot create {}: {}", dest.display(), e)))?;

        let mut stream = resp.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let data = chunk.map_err(|e| UpdateError::Download(format!("stream error: {}", e)))?;
            file.write_all(&data)
                .await
                .map_err(|e| UpdateError::Download(format!("write error: {}", e)))?;
            written += data.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| UpdateError::Download(format!("flush error: {}", e)))?;

        info!("Downloaded {} bytes to {}", written, dest.display());
        Ok(())
    }

    async fn install(&self, script: &Path) -> Result<(), UpdateError> {
        let (program, args) = self
            .config
            .install_command
            .split_first()
            .ok_or_else(|| UpdateError::Install("no install command configured".into()))?;

        info!("Running installer {} via {}", script.display(), program);
        let status = Command::new(program)
            .args(args)
            .arg(script)
            .status()
            .await
            .map_err(|e| UpdateError::Install(format!("could not start {}: {}", program, e)))?;

        if !status.success() {
            error!("Installer exited with {}", status);
            return Err(UpdateError::Install(format!("installer exited with {}", status)));
        }
        Ok(())
    }
}

/// Replaces `dest` with a fresh directory holding the contents of the
/// gzip-compressed tar at `archive`.
async fn extract(archive: &Path, dest: &Path) -> Result<(), UpdateError> {
    if tokio::fs::try_exists(dest).await.unwrap_or(false) {
        tokio::fs::remove_dir_all(dest)
            .await
            .map_err(|e| UpdateError::Extraction(format!("cannot clear {}: {}", dest.display(), e)))?;
    }
    tokio::fs::create_dir_all(dest)
        .await
        .map_err(|e| UpdateError::Extraction(format!("cannot create {}: {}", dest.display(), e)))?;

    let status = Command::new("tar")
        .arg("-xzf")
        .arg(archive)
        .arg("-C")
        .arg(dest)
        .status()
        .await
        .map_err(|e| UpdateError::Extraction(format!("could not run tar: {}", e)))?;

    if !status.success() {
        return Err(UpdateError::Extraction(format!("tar exited with {}", status)));
    }

    debug!("Extracted {} into {}", archive.display(), dest.display());
    Ok(())
}

/// Top-down search for the install script: a directory's own files are
/// checked before its subdirectories, which are visited in name order.
pub fn find_install_script(root: &Path) -> Option<PathBuf> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Skipping {}: {}", root.display(), e);
            return None;
        }
    };

    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            subdirs.push(path);
        } else if entry.file_name() == INSTALL_SCRIPT_NAME {
            return Some(path);
        }
    }

    subdirs.sort();
    subdirs.iter().find_map(|dir| find_install_script(dir))
}

use thiserror::Error;

/// Reasons an update run stops before completing. Every variant leaves the
/// backup (if one was taken) in place for manual recovery.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("Failed to backup user data")]
    Backup,

    #[error("No update package found")]
    NoPackage,

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Install failed: {0}")]
    Install(String),
}

/// Why the release feed could not be read. Never surfaced to callers: the
/// checker logs it and reports "no update".
#[derive(Debug, Error)]
pub(crate) enum CheckError {
    #[error("release feed unreachable: {0}")]
    NetworkUnavailable(#[from] reqwest::Error),

    #[error("release feed returned {0}")]
    Status(reqwest::StatusCode),
}

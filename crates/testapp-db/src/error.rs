use thiserror::Error;

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Message shown to the user when an operation fails.
    pub fn user_message(&self) -> String {
        match self {
            Self::DuplicateUsername(_) => "Username already exists!".to_string(),
            other => other.to_string(),
        }
    }
}

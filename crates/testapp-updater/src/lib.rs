pub mod backup;
pub mod checker;
pub mod error;
pub mod installer;
pub mod task;

pub use backup::BackupManager;
pub use checker::UpdateChecker;
pub use error::UpdateError;
pub use installer::{InstallReport, Installer, UpdateStage};
pub use task::{UpdateEvent, UpdateTask};

use reqwest::Client;
use testapp_types::APP_VERSION;

/// Shared HTTP client for the release feed and package downloads.
///
/// No overall timeout is set here: downloads stream for as long as the
/// transport allows, and the metadata request applies its own limit.
pub fn http_client() -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(format!("simple-test-app/{}", APP_VERSION))
        .build()
}

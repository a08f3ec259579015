use std::time::Duration;

use reqwest::{Client, StatusCode};
use testapp_types::{AppConfig, ReleaseDescriptor};
use tracing::{info, warn};

use crate::error::CheckError;

/// Asks the release feed for its latest release.
#[derive(Debug, Clone)]
pub struct UpdateChecker {
    client: Client,
    releases_url: String,
    timeout: Duration,
}

impl UpdateChecker {
    pub fn new(client: Client, config: &AppConfig) -> Self {
        Self {
            client,
            releases_url: config.releases_url.clone(),
            timeout: config.metadata_timeout,
        }
    }

    /// Returns the latest release if its tag (minus a leading `v`) differs
    /// from `current_version`. The comparison is plain string inequality, so
    /// an older tag also counts as an update.
    ///
    /// Network failures and non-200 responses are logged and reported as
    /// `None`.
    pub async fn check_for_update(&self, current_version: &str) -> Option<ReleaseDescriptor> {
        let release = match self.fetch_latest().await {
            Ok(release) => release,
            Err(e) => {
                warn!("Could not check for updates: {}", e);
                return None;
            }
        };

        let latest = release.latest_version();
        if !latest.is_empty() && latest != current_version {
            info!("New version available: {} (running {})", latest, current_version);
            Some(release)
        } else {
            info!("You are running the latest version ({})", current_version);
            None
        }
    }

    async fn fetch_latest(&self) -> Result<ReleaseDescriptor, CheckError> {
        let resp = self
            .client
            .get(&self.releases_url)
            .timeout(self.timeout)
            .send()
            .await?;

        if resp.status() != StatusCode::OK {
            return Err(CheckError::Status(resp.status()));
        }

        Ok(resp.json::<ReleaseDescriptor>().await?)
    }
}

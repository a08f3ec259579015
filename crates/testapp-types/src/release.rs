use serde::{Deserialize, Serialize};

/// Metadata for the latest published release, as returned by the
/// releases endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDescriptor {
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
}

impl ReleaseDescriptor {
    /// The tag with any leading `v` stripped (`v1.0.1` -> `1.0.1`).
    pub fn latest_version(&self) -> &str {
        self.tag_name.trim_start_matches('v')
    }

    /// First asset whose name ends with `suffix`, in feed order.
    pub fn find_asset(&self, suffix: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| asset.name.ends_with(suffix))
    }
}

pub mod config;
pub mod models;
pub mod release;

pub use config::AppConfig;
pub use models::UserSummary;
pub use release::{ReleaseAsset, ReleaseDescriptor};

/// Display name shown in the window header and the update prompt.
pub const APP_NAME: &str = "SimpleTestApp";

/// The one compiled-in version literal. The store's persisted setting and the
/// updater's comparison both derive from it.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

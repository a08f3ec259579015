use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::APP_VERSION;

pub const DEFAULT_RELEASES_URL: &str =
    "https://api.github.com/repos/pahilabs/simple-test-app/releases/latest";
pub const DEFAULT_INSTALL_COMMAND: &str = "sudo bash";

/// Release assets must end with this to be picked as the update package.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";
/// Name of the script searched for inside the extracted package.
pub const INSTALL_SCRIPT_NAME: &str = "install.sh";

const DATA_DIR_NAME: &str = ".simple-test-app";
const DB_FILE_NAME: &str = "users.db";
const BACKUP_DIR_NAME: &str = "backup";
const EXTRACT_DIR_NAME: &str = "simple-test-app-update";

/// Paths, endpoints and timings shared by the store and the updater.
///
/// Built once at startup (see [`AppConfig::from_env`]) and handed to each
/// component, so tests can point everything at a scratch directory and a
/// local release feed.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Holds the live database and the backup directory.
    pub data_dir: PathBuf,
    /// Scratch area for the downloaded archive and its extraction.
    pub temp_dir: PathBuf,
    pub releases_url: String,
    /// Program and leading arguments used to run the install script; the
    /// script path is appended.
    pub install_command: Vec<String>,
    /// Delay between startup and the background update check.
    pub update_delay: Duration,
    /// Pause between a finished install and the restore step.
    pub restore_delay: Duration,
    pub metadata_timeout: Duration,
    /// Compared against the feed's tag. Always [`APP_VERSION`] outside tests.
    pub current_version: String,
}

impl AppConfig {
    /// Defaults rooted at `data_dir` and `temp_dir`.
    pub fn new(data_dir: impl Into<PathBuf>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            temp_dir: temp_dir.into(),
            releases_url: DEFAULT_RELEASES_URL.to_string(),
            install_command: default_install_command(),
            update_delay: Duration::from_secs(2),
            restore_delay: Duration::from_millis(1000),
            metadata_timeout: Duration::from_secs(5),
            current_version: APP_VERSION.to_string(),
        }
    }

    /// Reads `TESTAPP_*` variables, falling back to the defaults for anything
    /// unset, empty or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from `lookup`, which maps a variable name to its
    /// value. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let data_dir = var("TESTAPP_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        let temp_dir = var("TESTAPP_TEMP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        let mut config = Self::new(data_dir, temp_dir);

        if let Some(url) = var("TESTAPP_RELEASES_URL") {
            config.releases_url = url;
        }
        if let Some(raw) = var("TESTAPP_INSTALL_COMMAND") {
            match shlex::split(&raw) {
                Some(parts) if !parts.is_empty() => config.install_command = parts,
                _ => warn!("Ignoring unparsable TESTAPP_INSTALL_COMMAND: {:?}", raw),
            }
        }
        let number = |key: &str| var(key).and_then(|raw| parse_number(key, &raw));
        if let Some(secs) = number("TESTAPP_UPDATE_DELAY_SECS") {
            config.update_delay = Duration::from_secs(secs);
        }
        if let Some(ms) = number("TESTAPP_RESTORE_DELAY_MS") {
            config.restore_delay = Duration::from_millis(ms);
        }

        config
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.data_dir.join(BACKUP_DIR_NAME)
    }

    pub fn backup_path(&self) -> PathBuf {
        self.backup_dir().join(DB_FILE_NAME)
    }

    /// Where the release archive for `version` is streamed to.
    pub fn download_path(&self, version: &str) -> PathBuf {
        self.temp_dir
            .join(format!("simple-test-app-{}{}", version, ARCHIVE_SUFFIX))
    }

    pub fn extract_dir(&self) -> PathBuf {
        self.temp_dir.join(EXTRACT_DIR_NAME)
    }
}

fn default_data_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(DATA_DIR_NAME),
        None => {
            warn!("Could not resolve a home directory, using ./{}", DATA_DIR_NAME);
            PathBuf::from(DATA_DIR_NAME)
        }
    }
}

fn default_install_command() -> Vec<String> {
    DEFAULT_INSTALL_COMMAND
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn parse_number(key: &str, raw: &str) -> Option<u64> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring non-numeric {}={:?}", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths_hang_off_the_configured_dirs() {
        let config = AppConfig::new("/data/app", "/scratch");

        assert_eq!(config.db_path(), PathBuf::from("/data/app/users.db"));
        assert_eq!(config.backup_path(), PathBuf::from("/data/app/backup/users.db"));
        assert_eq!(
            config.download_path("1.2.0"),
            PathBuf::from("/scratch/simple-test-app-1.2.0.tar.gz")
        );
        assert_eq!(
            config.extract_dir(),
            PathBuf::from("/scratch/simple-test-app-update")
        );
    }

    #[test]
    fn defaults_track_the_compiled_version() {
        let config = AppConfig::new("/d", "/t");

        assert_eq!(config.current_version, APP_VERSION);
        assert_eq!(config.install_command, vec!["sudo", "bash"]);
        assert_eq!(config.metadata_timeout, Duration::from_secs(5));
        assert_eq!(config.releases_url, DEFAULT_RELEASES_URL);
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| {
            vars.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn empty_variables_fall_back_to_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("TESTAPP_DATA_DIR", ""),
            ("TESTAPP_TEMP_DIR", ""),
            ("TESTAPP_RELEASES_URL", ""),
            ("TESTAPP_INSTALL_COMMAND", "  "),
            ("TESTAPP_UPDATE_DELAY_SECS", ""),
        ]));

        assert_ne!(config.data_dir, PathBuf::from(""));
        assert!(config.data_dir.ends_with(".simple-test-app"));
        assert_eq!(config.temp_dir, std::env::temp_dir());
        assert_ne!(config.db_path(), PathBuf::from("users.db"));
        assert_eq!(config.releases_url, DEFAULT_RELEASES_URL);
        assert_eq!(config.install_command, vec!["sudo", "bash"]);
        assert_eq!(config.update_delay, Duration::from_secs(2));
    }

    #[test]
    fn set_variables_override_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("TESTAPP_DATA_DIR", "/srv/app-data"),
            ("TESTAPP_TEMP_DIR", "/srv/scratch"),
            ("TESTAPP_RELEASES_URL", "http://127.0.0.1:8080/latest"),
            ("TESTAPP_INSTALL_COMMAND", "pkexec bash -e"),
            ("TESTAPP_UPDATE_DELAY_SECS", "7"),
            ("TESTAPP_RESTORE_DELAY_MS", "250"),
        ]));

        assert_eq!(config.db_path(), PathBuf::from("/srv/app-data/users.db"));
        assert_eq!(config.extract_dir(), PathBuf::from("/srv/scratch/simple-test-app-update"));
        assert_eq!(config.releases_url, "http://127.0.0.1:8080/latest");
        assert_eq!(config.install_command, vec!["pkexec", "bash", "-e"]);
        assert_eq!(config.update_delay, Duration::from_secs(7));
        assert_eq!(config.restore_delay, Duration::from_millis(250));
    }

    #[test]
    fn quoted_install_command_keeps_spaces() {
        let config = AppConfig::from_lookup(lookup(&[(
            "TESTAPP_INSTALL_COMMAND",
            "'/opt/my tools/run' --elevated",
        )]));
        assert_eq!(config.install_command, vec!["/opt/my tools/run", "--elevated"]);
    }

    #[test]
    fn unparsable_values_are_ignored() {
        let config = AppConfig::from_lookup(lookup(&[
            ("TESTAPP_INSTALL_COMMAND", "sudo 'unterminated"),
            ("TESTAPP_UPDATE_DELAY_SECS", "soon"),
            ("TESTAPP_RESTORE_DELAY_MS", "-5"),
        ]));

        assert_eq!(config.install_command, vec!["sudo", "bash"]);
        assert_eq!(config.update_delay, Duration::from_secs(2));
        assert_eq!(config.restore_delay, Duration::from_millis(1000));
    }
}

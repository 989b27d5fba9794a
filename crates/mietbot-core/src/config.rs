//! Configuration management for mietbot.
//!
//! Provides TOML-based configuration with XDG-compliant paths. Environment
//! overrides are applied once, at the process boundary, via
//! [`AppConfig::apply_env_overrides`]; everything below the binary receives
//! the finished config by reference and never touches the environment.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration.
///
/// Loaded from `~/.config/mietbot/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Crawl loop settings
    pub crawler: CrawlerSection,
    /// Browser automation settings
    pub browser: BrowserSection,
    /// Ledger and profile storage settings
    pub store: StoreSection,
    /// Remote document-store connection settings
    pub remote: RemoteSection,
    /// Application notification settings
    pub notify: NotifySection,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path.
    ///
    /// Unlike [`AppConfig::load`], a missing file is an error here: the
    /// operator asked for this exact file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }
        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Apply environment variable overrides to an already-loaded config.
    ///
    /// Supported variables:
    /// - `MIETBOT_HEADLESS`: browser headless mode (true/false)
    /// - `MIETBOT_LEDGER_BACKEND`: ledger backend selector (`file`/`remote`)
    /// - `MIETBOT_CONFIG_SOURCE`: profile source selector (`file`/`remote`)
    /// - `MIETBOT_PROFILE_KEY`: remote profile document key
    /// - `MIETBOT_REMOTE_PROJECT_ID`: remote store project id
    /// - `MIETBOT_REMOTE_COLLECTION`: remote ledger collection
    /// - `MIETBOT_REMOTE_CREDENTIALS`: remote credential file path
    /// - `MIETBOT_REMOTE_DATABASE`: remote database id
    ///
    /// CLI flags are applied after this and take precedence.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MIETBOT_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("MIETBOT_LEDGER_BACKEND") {
            tracing::debug!("Override store.ledger_backend from env: {}", val);
            self.store.ledger_backend = val;
        }

        if let Ok(val) = std::env::var("MIETBOT_CONFIG_SOURCE") {
            tracing::debug!("Override store.profile_source from env: {}", val);
            self.store.profile_source = val;
        }

        if let Ok(val) = std::env::var("MIETBOT_PROFILE_KEY") {
            self.store.profile_key = Some(val);
        }

        if let Ok(val) = std::env::var("MIETBOT_REMOTE_PROJECT_ID") {
            self.remote.project_id = Some(val);
        }

        if let Ok(val) = std::env::var("MIETBOT_REMOTE_COLLECTION") {
            self.remote.collection = val;
        }

        if let Ok(val) = std::env::var("MIETBOT_REMOTE_CREDENTIALS") {
            self.remote.credentials_path = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("MIETBOT_REMOTE_DATABASE") {
            self.remote.database = val;
        }
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/mietbot/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("de", "mietbot", "mietbot").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/mietbot`. The file ledger
    /// and page snapshots default to living under here.
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("de", "mietbot", "mietbot").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

/// Crawl loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct CrawlerSection {
    /// Listing catalog start URL
    pub start_url: String,
    /// Idle refresh interval in minutes when no listings are found
    pub refresh_interval_minutes: u64,
    /// Wait after a successful application, human-readable (`"30s"`, `"5m"`, `"1h"`)
    pub application_delay: String,
    /// Process one pass and exit
    pub run_once: bool,
    /// Exit once pagination reports the last page
    pub exit_on_last_page: bool,
    /// Fill forms but never submit
    pub dry_run: bool,
}

impl Default for CrawlerSection {
    fn default() -> Self {
        Self {
            start_url: "https://www.wbm.de/wohnungen-berlin/angebote/".to_string(),
            refresh_interval_minutes: 3,
            application_delay: "10s".to_string(),
            run_once: false,
            exit_on_last_page: true,
            dry_run: false,
        }
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSection {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Navigation timeout in seconds
    pub navigation_timeout_secs: u64,
    /// Directory for page snapshots (HTML + screenshots); disabled when unset
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for BrowserSection {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            navigation_timeout_secs: 30,
            snapshot_dir: None,
        }
    }
}

/// Ledger and profile storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Ledger backend selector: `file` or `remote`
    pub ledger_backend: String,
    /// File ledger path; defaults to `<data_dir>/applications.json`
    pub ledger_path: Option<PathBuf>,
    /// Profile source selector: `file` or `remote`
    pub profile_source: String,
    /// Profile file path; defaults to `<config_dir>/profile.json`
    pub profile_path: Option<PathBuf>,
    /// Remote profile document key
    pub profile_key: Option<String>,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            ledger_backend: "file".to_string(),
            ledger_path: None,
            profile_source: "file".to_string(),
            profile_path: None,
            profile_key: None,
        }
    }
}

/// Remote document-store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSection {
    /// Project id of the document store
    pub project_id: Option<String>,
    /// Database id within the project
    pub database: String,
    /// Collection holding application records
    pub collection: String,
    /// Collection holding profile documents
    pub profile_collection: String,
    /// Path to the credential file (JSON with a bearer token)
    pub credentials_path: Option<PathBuf>,
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            project_id: None,
            database: "(default)".to_string(),
            collection: "mietbot_applications".to_string(),
            profile_collection: "mietbot_users".to_string(),
            credentials_path: None,
        }
    }
}

/// Application notification settings.
///
/// Notifications are sent only when all SMTP fields and the profile's
/// notification address are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifySection {
    /// SMTP relay host
    pub smtp_host: Option<String>,
    /// SMTP relay port
    pub smtp_port: Option<u16>,
    /// SMTP username
    pub smtp_username: Option<String>,
    /// SMTP password
    pub smtp_password: Option<String>,
    /// From address for notification mail
    pub from_address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.crawler.refresh_interval_minutes, 3);
        assert_eq!(config.crawler.application_delay, "10s");
        assert!(config.crawler.exit_on_last_page);
        assert!(!config.crawler.run_once);
        assert!(config.browser.headless);
        assert_eq!(config.store.ledger_backend, "file");
        assert_eq!(config.remote.database, "(default)");
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[crawler]"));
        assert!(toml_str.contains("[browser]"));
        assert!(toml_str.contains("[store]"));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(parsed.crawler.start_url, config.crawler.start_url);
    }

    #[test]
    fn test_config_load_from() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");

        let mut config = AppConfig::default();
        config.crawler.refresh_interval_minutes = 7;
        config.store.ledger_backend = "remote".to_string();

        let contents = toml::to_string_pretty(&config).expect("serialize config");
        fs::write(&config_path, contents).expect("write config file");

        let loaded = AppConfig::load_from(&config_path).expect("load config file");
        assert_eq!(loaded.crawler.refresh_interval_minutes, 7);
        assert_eq!(loaded.store.ledger_backend, "remote");
    }

    #[test]
    fn test_load_from_missing_is_error() {
        let tmp = TempDir::new().expect("create temp dir");
        let result = AppConfig::load_from(&tmp.path().join("nope.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("MIETBOT_LEDGER_BACKEND", "remote");
        std::env::set_var("MIETBOT_REMOTE_PROJECT_ID", "test-project");
        std::env::set_var("MIETBOT_HEADLESS", "false");

        let mut config = AppConfig::default();
        config.apply_env_overrides();

        assert_eq!(config.store.ledger_backend, "remote");
        assert_eq!(config.remote.project_id.as_deref(), Some("test-project"));
        assert!(!config.browser.headless);

        std::env::remove_var("MIETBOT_LEDGER_BACKEND");
        std::env::remove_var("MIETBOT_REMOTE_PROJECT_ID");
        std::env::remove_var("MIETBOT_HEADLESS");
    }

    #[test]
    fn test_partial_config() {
        // Partial TOML fills the rest with defaults
        let toml_str = r#"
[crawler]
refresh_interval_minutes = 10

[store]
ledger_backend = "remote"
"#;

        let config: AppConfig = toml::from_str(toml_str).expect("parse partial config");
        assert_eq!(config.crawler.refresh_interval_minutes, 10);
        assert_eq!(config.store.ledger_backend, "remote");
        // These should be defaults
        assert_eq!(config.crawler.application_delay, "10s");
        assert!(config.browser.headless);
        assert_eq!(config.remote.collection, "mietbot_applications");
    }
}

//! Configuration infrastructure
//!
//! Settings are layered with the `config` crate:
//! 1. Built-in defaults (`AppConfig::default()`)
//! 2. Optional JSON file (user config dir or an explicit path)
//! 3. `IPDB_MIRROR__<SECTION>__<KEY>` environment variables

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::domain::pagination::{CategoryEntry, default_category_table};
use crate::infrastructure::parsing::ListingLayoutConfig;

const APP_DIR_NAME: &str = "ipdb-mirror";
const CONFIG_FILE_NAME: &str = "ipdb_mirror_config.json";
const ENV_PREFIX: &str = "IPDB_MIRROR";

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub remote: RemoteConfig,
    pub http: HttpConfig,
    pub parsing: ListingLayoutConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

/// Where and how the listing is paged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Site root the listing path is resolved against
    pub base_url: String,

    pub listing_path: String,

    /// Records per listing page; page `n` starts at `n * page_size`
    pub page_size: u32,

    /// Categories in sync order with their query segments
    pub categories: Vec<CategoryEntry>,

    /// Stop a category after this many pages even if the listing continues
    pub max_pages_per_category: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,

    /// 0 disables the rate limiter
    pub max_requests_per_second: u32,

    /// Total attempts per page, including the first
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    pub json_format: bool,
    pub console_output: bool,
    pub file_output: bool,

    /// Directory for log files; defaults to `logs/` in the app data dir
    pub directory: Option<PathBuf>,

    /// Number of log files to keep (older files are deleted)
    pub max_files: u32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            listing_path: defaults::LISTING_PATH.to_string(),
            page_size: defaults::PAGE_SIZE,
            categories: default_category_table(),
            max_pages_per_category: None,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
            retry_attempts: defaults::RETRY_ATTEMPTS,
            retry_delay_ms: defaults::RETRY_DELAY_MS,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: defaults::DATABASE_URL.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            directory: None,
            max_files: 7,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.remote.base_url)
            .with_context(|| format!("Invalid remote.base_url: {}", self.remote.base_url))?;
        anyhow::ensure!(self.remote.page_size > 0, "remote.page_size must be positive");
        anyhow::ensure!(
            !self.remote.categories.is_empty(),
            "remote.categories must list at least one category"
        );
        anyhow::ensure!(self.http.retry_attempts > 0, "http.retry_attempts must be at least 1");
        self.parsing
            .validate()
            .context("Invalid parsing configuration")?;
        Ok(())
    }
}

pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(APP_DIR_NAME);
        Ok(config_dir)
    }

    pub fn get_app_data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .context("Failed to get user data directory")?
            .join(APP_DIR_NAME);
        Ok(data_dir)
    }

    pub fn new() -> Result<Self> {
        Ok(Self {
            config_path: Self::get_config_dir()?.join(CONFIG_FILE_NAME),
        })
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Layer defaults, the JSON file (if present) and environment overrides
    pub fn load(&self) -> Result<AppConfig> {
        let defaults = Config::try_from(&AppConfig::default())
            .context("Failed to serialize default configuration")?;

        let settings = Config::builder()
            .add_source(defaults)
            .add_source(
                File::from(self.config_path.as_path())
                    .format(FileFormat::Json)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to load configuration from {:?}", self.config_path))?;

        let config: AppConfig = settings
            .try_deserialize()
            .context("Configuration has an unexpected shape")?;
        config.validate()?;
        Ok(config)
    }

    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Write the default file when none exists, then load
    pub async fn initialize_on_first_run(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!("First run detected - writing default configuration");
            self.save_config(&AppConfig::default()).await?;
        }
        self.load()
    }
}

pub mod defaults {
    pub const BASE_URL: &str = "http://localhost/";
    pub const LISTING_PATH: &str = "index.php";
    pub const PAGE_SIZE: u32 = crate::domain::pagination::DEFAULT_PAGE_SIZE;
    pub const USER_AGENT: &str = "ipdb-mirror/0.2";
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;
    pub const MAX_REQUESTS_PER_SECOND: u32 = 2;
    pub const RETRY_ATTEMPTS: u32 = 1;
    pub const RETRY_DELAY_MS: u64 = 1000;
    pub const DATABASE_URL: &str = "sqlite:local.db";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::ServerCategory;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.remote.categories.len(), 3);
        assert_eq!(config.remote.categories[1].category, ServerCategory::Private);
        assert_eq!(config.http.retry_attempts, 1);
        assert_eq!(config.database.url, "sqlite:local.db");
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("absent.json"));
        let config = manager.load().unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file_overrides_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "remote": {
                "base_url": "https://listing.example/",
                "max_pages_per_category": 5
            } }"#,
        )
        .unwrap();

        let config = ConfigManager::with_path(&path).load().unwrap();
        assert_eq!(config.remote.base_url, "https://listing.example/");
        assert_eq!(config.remote.max_pages_per_category, Some(5));
        assert_eq!(config.remote.page_size, 20);
        assert_eq!(config.parsing, ListingLayoutConfig::default());
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let config = AppConfig {
            remote: RemoteConfig {
                base_url: "not a url".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_first_run_writes_default_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let manager = ConfigManager::with_path(&path);

        let config = manager.initialize_on_first_run().await.unwrap();
        assert!(path.exists());
        assert_eq!(config, AppConfig::default());
    }
}

//! Configuration management for LAADS Mirror
//!
//! This module provides unified configuration management with multi-source
//! loading and zero-config defaults. Core components never read the
//! environment themselves; they receive the values resolved here.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::client::ClientConfig;
use crate::app::fetch::FetchPolicy;
use crate::constants::{env, limits, logging, workers};
use crate::errors::{ConfigError, ConfigResult};

/// Name of the project-local config file
pub const LOCAL_CONFIG_FILE: &str = "laads-mirror.toml";

/// Directory name under the platform config and data directories
pub const APP_DIR: &str = "laads-mirror";

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Storage locations
    pub storage: StorageConfigToml,
    /// HTTP session settings
    pub client: ClientConfig,
    /// Retry policy of every fetch
    pub fetch: FetchPolicy,
    /// Worker pool widths
    pub concurrency: ConcurrencyConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly storage configuration; unset paths use the platform data directory
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfigToml {
    /// Dataset specs, catalog snapshots and download logs
    pub support_dir: Option<PathBuf>,
    /// Downloaded files, one subdirectory per dataset
    pub inputs_dir: Option<PathBuf>,
    /// Per-run log files
    pub logs_dir: Option<PathBuf>,
    /// Scratch space for downstream processing
    pub work_dir: Option<PathBuf>,
}

/// Resolved storage locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub support_dir: PathBuf,
    pub inputs_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub work_dir: PathBuf,
}

impl StorageConfig {
    /// All four directories under one root
    pub fn under(root: &Path) -> Self {
        Self {
            support_dir: root.join("support"),
            inputs_dir: root.join("inputs"),
            logs_dir: root.join("logs"),
            work_dir: root.join("work"),
        }
    }

    /// Create every directory that does not exist yet
    pub fn ensure_dirs(&self) -> ConfigResult<()> {
        for dir in [
            &self.support_dir,
            &self.inputs_dir,
            &self.logs_dir,
            &self.work_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

impl StorageConfigToml {
    /// Convert to runtime StorageConfig
    pub fn to_runtime_config(&self) -> StorageConfig {
        let defaults = StorageConfig::under(&default_data_root());
        StorageConfig {
            support_dir: self.support_dir.clone().unwrap_or(defaults.support_dir),
            inputs_dir: self.inputs_dir.clone().unwrap_or(defaults.inputs_dir),
            logs_dir: self.logs_dir.clone().unwrap_or(defaults.logs_dir),
            work_dir: self.work_dir.clone().unwrap_or(defaults.work_dir),
        }
    }
}

/// Worker pool widths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    /// Concurrent listing fetches while crawling
    pub crawl_width: usize,
    /// Concurrent file downloads
    pub download_width: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            crawl_width: workers::DEFAULT_CRAWL_WIDTH,
            download_width: workers::DEFAULT_DOWNLOAD_WIDTH,
        }
    }
}

impl ConcurrencyConfig {
    fn validate(&self) -> ConfigResult<()> {
        for (field, value) in [
            ("concurrency.crawl_width", self.crawl_width),
            ("concurrency.download_width", self.download_width),
        ] {
            if value == 0 || value > workers::MAX_WIDTH {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.to_string(),
                    reason: format!("Must be between 1 and {}", workers::MAX_WIDTH),
                });
            }
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
    /// Write a per-run log file into the logs directory
    pub file_logging: bool,
    /// Enable colored output
    pub colored_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
            file_logging: true,
            colored_output: true,
        }
    }
}

impl AppConfig {
    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (explicit path, then `./laads-mirror.toml`, then the user config directory)
    /// 3. Environment variables
    ///
    /// CLI arguments are applied on top by the caller.
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        let mut config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Environment overrides other than the credential
    fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = std::env::var(env::BASE_URL) {
            if !base_url.trim().is_empty() {
                debug!("Using archive base URL from {}", env::BASE_URL);
                self.client.base_url = base_url;
            }
        }
    }

    /// Reject values no run could work with
    pub fn validate(&self) -> ConfigResult<()> {
        self.fetch.validate()?;
        self.concurrency.validate()?;
        if self.client.rate_limit_rps == 0 {
            return Err(ConfigError::InvalidValue {
                field: "client.rate_limit_rps".to_string(),
                value: "0".to_string(),
                reason: "Rate limit must be non-zero".to_string(),
            });
        }
        if url::Url::parse(&self.client.base_url).is_err() {
            return Err(ConfigError::InvalidValue {
                field: "client.base_url".to_string(),
                value: self.client.base_url.clone(),
                reason: "Not an absolute URL".to_string(),
            });
        }
        Ok(())
    }

    /// Resolved storage locations
    pub fn storage(&self) -> StorageConfig {
        self.storage.to_runtime_config()
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(".").join(LOCAL_CONFIG_FILE)];
        if let Ok(path) = Self::default_config_path() {
            search_paths.push(path);
        }

        for path in search_paths {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        debug!("No config file found in standard locations");
        None
    }

    /// Get the default config file path for the current user
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(APP_DIR).join("config.toml"))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Write the commented default configuration to `path`
    ///
    /// An existing file is only replaced when `force` is set.
    pub async fn initialize(path: &Path, force: bool) -> ConfigResult<()> {
        if path.exists() && !force {
            return Err(ConfigError::InvalidValue {
                field: "config".to_string(),
                value: path.display().to_string(),
                reason: "File already exists; use --force to replace it".to_string(),
            });
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, Self::generate_default_config_content()).await?;
        info!("Created configuration file {}", path.display());
        Ok(())
    }

    /// Effective configuration as TOML
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        let default_root = default_data_root();

        format!(
            r#"# LAADS Mirror Configuration
# The archive token is never stored here: set LAADS_TOKEN in the
# environment or in a .env file next to where you run the tool.

[storage]
# Unset directories default to {root}/<support|inputs|logs|work>
# support_dir = "/path/to/support"   # dataset specs, catalogs, download logs
# inputs_dir = "/path/to/inputs"     # downloaded files
# logs_dir = "/path/to/logs"         # per-run log files
# work_dir = "/path/to/work"

[client]
base_url = "{base_url}"
tcp_keepalive = "30s"
tcp_nodelay = true
pool_idle_timeout = "90s"
pool_max_per_host = {pool}
request_timeout = "{request_timeout}s"
connect_timeout = "{connect_timeout}s"
rate_limit_rps = {rps}

[fetch]
# Wait before attempt k (k >= 2) is backoff_base + (k - 1) * backoff_increment
backoff_base = "{backoff_base}s"
backoff_increment = "{backoff_increment}s"
max_attempts = {max_attempts}
attempts_per_session = {attempts_per_session}

[concurrency]
crawl_width = {crawl_width}
download_width = {download_width}

[logging]
level = "{level}"  # error, warn, info, debug, trace
file_logging = true
colored_output = true
"#,
            root = default_root.display(),
            base_url = crate::constants::laads::ALLDATA_URL,
            pool = crate::constants::http::POOL_MAX_PER_HOST,
            request_timeout = crate::constants::http::DEFAULT_TIMEOUT.as_secs(),
            connect_timeout = crate::constants::http::CONNECT_TIMEOUT.as_secs(),
            rps = limits::DEFAULT_RATE_LIMIT_RPS,
            backoff_base = limits::BACKOFF_BASE.as_secs(),
            backoff_increment = limits::BACKOFF_INCREMENT.as_secs(),
            max_attempts = limits::MAX_ATTEMPTS,
            attempts_per_session = limits::ATTEMPTS_PER_SESSION,
            crawl_width = workers::DEFAULT_CRAWL_WIDTH,
            download_width = workers::DEFAULT_DOWNLOAD_WIDTH,
            level = logging::DEFAULT_LOG_LEVEL,
        )
    }
}

/// `<data_dir>/laads-mirror`, or `./laads-mirror` without a platform data directory
pub fn default_data_root() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR))
}

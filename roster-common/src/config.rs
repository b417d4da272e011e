//! Configuration loading and resolution
//!
//! Every setting is resolved with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: the console logs a warning and runs
//! on defaults. A TOML file that exists but does not parse is an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::LoginCredentials;
use crate::{Error, Result};

pub const ENV_CONFIG: &str = "ROSTER_CONFIG";
pub const ENV_BASE_URL: &str = "ROSTER_API_BASE_URL";
pub const ENV_API_KEY: &str = "ROSTER_API_KEY";
pub const ENV_API_USERNAME: &str = "ROSTER_API_USERNAME";
pub const ENV_API_PASSWORD: &str = "ROSTER_API_PASSWORD";
pub const ENV_DATA_FOLDER: &str = "ROSTER_DATA_FOLDER";

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DEBOUNCE_MS: u64 = 1500;
pub const DEFAULT_AUTO_CLOSE_MS: u64 = 2000;
pub const DEFAULT_MAX_ROWS: usize = 1000;
pub const DEFAULT_VISIBLE_ERRORS: usize = 50;
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ========================================
// TOML file schema
// ========================================

/// `[api]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// `[console]` section: the credentials accepted at login
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleSection {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// `[search]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub debounce_ms: Option<u64>,
}

/// `[import]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSection {
    pub auto_close_ms: Option<u64>,
    pub max_rows: Option<usize>,
    pub visible_errors: Option<usize>,
}

/// `[logging]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

/// On-disk configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub data_folder: Option<PathBuf>,
    pub api: ApiSection,
    pub console: ConsoleSection,
    pub search: SearchSection,
    pub import: ImportSection,
    pub logging: LoggingConfig,
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Write a TOML config file, creating parent directories as needed
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize config failed: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Platform config file location: `<config_dir>/roster/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("roster").join("config.toml"))
}

/// Platform data folder: `<data_local_dir>/roster`
pub fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("roster"))
        .unwrap_or_else(|| PathBuf::from("./roster_data"))
}

// ========================================
// Resolved configuration
// ========================================

/// Connection settings for the remote API
#[derive(Clone, PartialEq)]
pub struct ApiSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
}

impl ApiSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            username: None,
            password: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Basic credentials, only when both halves are configured
    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) => Some((user, pass)),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ApiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<set>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Timing and limits of the bulk-import dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSettings {
    pub auto_close_delay: Duration,
    pub max_rows: usize,
    pub visible_errors: usize,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            auto_close_delay: Duration::from_millis(DEFAULT_AUTO_CLOSE_MS),
            max_rows: DEFAULT_MAX_ROWS,
            visible_errors: DEFAULT_VISIBLE_ERRORS,
        }
    }
}

/// Fully resolved console configuration
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub api: ApiSettings,
    /// Accepted login; `None` means no one can log in
    pub login: Option<LoginCredentials>,
    pub debounce_delay: Duration,
    pub import: ImportSettings,
    pub log_level: String,
    pub data_folder: PathBuf,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub base_url: Option<String>,
    pub data_folder: Option<PathBuf>,
}

/// Resolves [`ConsoleConfig`] from CLI, environment, TOML and defaults
pub struct ConfigResolver {
    overrides: ConfigOverrides,
}

impl ConfigResolver {
    pub fn new(overrides: ConfigOverrides) -> Self {
        Self { overrides }
    }

    /// Locate and load the TOML file
    ///
    /// An explicitly requested file (flag or `ROSTER_CONFIG`) must exist.
    /// The platform default file is optional.
    pub fn load_toml(&self) -> Result<TomlConfig> {
        let explicit = self
            .overrides
            .config_path
            .clone()
            .or_else(|| env_value(ENV_CONFIG).map(PathBuf::from));

        if let Some(path) = explicit {
            info!("Loading config from {}", path.display());
            return load_toml_config(&path);
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                info!("Loading config from {}", path.display());
                load_toml_config(&path)
            }
            Some(path) => {
                warn!("Config file not found at {}, using defaults", path.display());
                Ok(TomlConfig::default())
            }
            None => {
                warn!("Could not determine config directory, using defaults");
                Ok(TomlConfig::default())
            }
        }
    }

    pub fn resolve(&self) -> Result<ConsoleConfig> {
        let toml = self.load_toml()?;
        Ok(self.resolve_with(toml))
    }

    /// Apply CLI and environment overrides on top of an already loaded file
    pub fn resolve_with(&self, toml: TomlConfig) -> ConsoleConfig {
        let base_url = first_set(
            self.overrides.base_url.clone(),
            env_value(ENV_BASE_URL),
            toml.api.base_url,
        )
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let api = ApiSettings {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: first_set(None, env_value(ENV_API_KEY), toml.api.api_key),
            username: first_set(None, env_value(ENV_API_USERNAME), toml.api.username),
            password: first_set(None, env_value(ENV_API_PASSWORD), toml.api.password),
            timeout: Duration::from_secs(toml.api.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        };

        let login = match (
            non_blank(toml.console.username),
            non_blank(toml.console.password),
        ) {
            (Some(user), Some(pass)) => Some(LoginCredentials::new(user, pass)),
            _ => None,
        };

        let data_folder = self
            .overrides
            .data_folder
            .clone()
            .or_else(|| env_value(ENV_DATA_FOLDER).map(PathBuf::from))
            .or(toml.data_folder)
            .unwrap_or_else(default_data_folder);

        let import = ImportSettings {
            auto_close_delay: Duration::from_millis(
                toml.import.auto_close_ms.unwrap_or(DEFAULT_AUTO_CLOSE_MS),
            ),
            max_rows: toml.import.max_rows.unwrap_or(DEFAULT_MAX_ROWS),
            visible_errors: toml.import.visible_errors.unwrap_or(DEFAULT_VISIBLE_ERRORS),
        };

        let config = ConsoleConfig {
            api,
            login,
            debounce_delay: Duration::from_millis(
                toml.search.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS),
            ),
            import,
            log_level: non_blank(toml.logging.level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            data_folder,
        };
        debug!(?config, "Resolved console configuration");
        config
    }
}

fn env_value(name: &str) -> Option<String> {
    non_blank(std::env::var(name).ok())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn first_set(cli: Option<String>, env: Option<String>, toml: Option<String>) -> Option<String> {
    non_blank(cli).or(env).or_else(|| non_blank(toml))
}

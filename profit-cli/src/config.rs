//! `profit.toml` configuration.

use std::path::{Path, PathBuf};

use anyhow::Context;
use profit_core::db::DbConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "PROFIT_CONFIG";

/// Config file used when neither `--config` nor [`CONFIG_ENV`] is given.
pub const DEFAULT_CONFIG_FILE: &str = "profit.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Store used for signed-in users.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Fallback store used when nobody is signed in.
    #[serde(default)]
    pub local: LocalConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Registered backend name: "sqlite" | "local".
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_connection_string")]
    pub connection_string: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalConfig {
    /// JSON file holding local projects, or `:memory:`.
    #[serde(default = "default_local_path")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level or full filter directive, e.g. "info" or "profit_core=debug".
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file path. Empty = no log file.
    #[serde(default)]
    pub file: String,
}

fn default_backend() -> String {
    "sqlite".to_string()
}

fn default_connection_string() -> String {
    "sqlite:profit.db?mode=rwc".to_string()
}

fn default_local_path() -> String {
    "profit-projects.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            connection_string: default_connection_string(),
        }
    }
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            path: default_local_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: String::new(),
        }
    }
}

impl AppConfig {
    /// Resolves the config path: `explicit`, then `$PROFIT_CONFIG`, then
    /// `./profit.toml`.
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from(DEFAULT_CONFIG_FILE),
        }
    }

    /// Loads the config at `path`. Falls back to defaults if the file does
    /// not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config '{}'", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Connection settings for the signed-in store.
    pub fn database(&self) -> DbConfig {
        DbConfig::new(&self.database.backend, &self.database.connection_string)
    }

    /// Connection settings for the local fallback store.
    pub fn local(&self) -> DbConfig {
        DbConfig::new("local", &self.local.path)
    }

    /// Log file path, `None` when file logging is off.
    pub fn log_file(&self) -> Option<&Path> {
        let file = self.logging.file.trim();
        (!file.is_empty()).then(|| Path::new(file))
    }
}

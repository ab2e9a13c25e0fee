//! Configuration module for Stratus.
//!
//! Typed configuration structs that map to the YAML configuration file,
//! with loading, defaults, and a platform-appropriate default path.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level configuration for Stratus.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

/// Synchronization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Default recursion bound recorded by `stratus init`.
    pub default_depth: u32,
    /// How many parent directories to search when locating the sync root.
    pub root_search_depth: u32,
    /// Glob patterns excluded from every sync root, in addition to the
    /// built-in auto-ignores (the sync-state and ignore files themselves).
    pub auto_ignore: Vec<String>,
}

/// Remote listing cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds a cached listing or item stays fresh.
    pub ttl_secs: u64,
    /// Seconds between cache epochs; on expiry the entire cache is dropped.
    pub epoch_secs: u64,
    /// Override for the cache database location. Defaults to
    /// `$XDG_DATA_HOME/stratus/cache.db`.
    pub db_path: Option<PathBuf>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/stratus/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("stratus")
            .join("config.yaml")
    }

    /// Resolved location of the cache database.
    pub fn cache_db_path(&self) -> PathBuf {
        self.cache.db_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("stratus")
                .join("cache.db")
        })
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_depth: 3,
            root_search_depth: 16,
            auto_ignore: Vec::new(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            epoch_secs: 24 * 60 * 60,
            db_path: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

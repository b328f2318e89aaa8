//! # Configuration Management for CacheHaus
//!
//! This crate provides the configuration structures shared by the cache
//! components: the TOML file shape, the runtime `CacheOptions`, and the
//! per-collection table cache registrations.
//!
//! ## Quick Start
//!
//! ### Programmatic Configuration
//! ```rust
//! use config::CacheOptions;
//! use std::time::Duration;
//!
//! let options = CacheOptions::new()
//!     .with_query_cache(true)
//!     .with_table_cache(true)
//!     .with_query_cache_ttl(Duration::from_secs(300))
//!     .with_max_count_per_table(100);
//! ```
//!
//! ### TOML File Configuration
//! ```toml
//! database_name = "shop"
//!
//! [cache]
//! query_cache_enabled = true
//! table_cache_enabled = true
//! query_cache_ttl_seconds = 600
//! table_cache_ttl_seconds = 21600
//! query_cache_max_count_per_table = 50
//! media_type = "remote"
//! media_server = "redis://localhost:6379"
//! connection_timeout_ms = 5000
//!
//! [[table_cache]]
//! collection = "orders"
//! ttl_minutes = 30
//! ```
//!
//! Load configuration:
//! ```rust,no_run
//! use config::AppConfig;
//!
//! // Load from cachehaus.toml
//! let config = AppConfig::load()?;
//!
//! // Or load from custom path
//! let config = AppConfig::from_file("config/production.toml")?;
//! # Ok::<(), config::ConfigError>(())
//! ```

pub mod options;

pub use options::{
    CacheMediaType, CacheOptions, DEFAULT_CONNECTION_TIMEOUT_MS, DEFAULT_MEDIA_SERVER,
    DEFAULT_QUERY_CACHE_MAX_COUNT_PER_TABLE, DEFAULT_QUERY_CACHE_TTL, DEFAULT_TABLE_CACHE_TTL,
    MIN_REGISTRY_TTL,
};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{env, path::Path};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "./cachehaus.toml";
const CONFIG_PATH_ENV: &str = "CACHEHAUS_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Environment variable error: {0}")]
    Env(#[from] env::VarError),
    #[error("Dotenvy error: {0}")]
    Dotenvy(#[from] dotenvy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database_name: String,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub table_cache: Vec<TableCacheEntry>,
}

/// Cache configuration as written in the TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub query_cache_enabled: bool,
    pub table_cache_enabled: bool,
    /// Zero means "use the default"
    pub query_cache_ttl_seconds: u64,
    /// Zero means "use the default"
    pub table_cache_ttl_seconds: u64,
    pub query_cache_max_count_per_table: usize,
    pub media_type: CacheMediaType,
    pub media_server: Option<String>,
    pub connection_timeout_ms: u64,
}

/// Table cache registration for one collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableCacheEntry {
    pub collection: String,
    /// Snapshot lifetime; omitted means the default table cache TTL
    pub ttl_minutes: Option<u64>,
}

impl AppConfig {
    /// Load configuration from TOML file specified in .env or defaults
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e.into());
            }
        }

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            Self::from_file(&config_path)
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_file(DEFAULT_CONFIG_PATH)
        } else {
            Err(ConfigError::Invalid(format!(
                "Config path must be specified as {} or in {} file",
                CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH
            )))
        }
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        if self.database_name.is_empty() {
            return Err(ConfigError::Invalid(
                "Database name cannot be empty".to_string(),
            ));
        }

        self.cache.validate()?;

        for entry in &self.table_cache {
            if entry.collection.is_empty() {
                return Err(ConfigError::Invalid(
                    "Table cache collection name cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

impl CacheConfig {
    /// Validate cache values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.query_cache_max_count_per_table == 0 {
            return Err(ConfigError::Invalid(
                "Cache query_cache_max_count_per_table must be greater than 0".to_string(),
            ));
        }
        if self.connection_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "Cache connection_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.media_type == CacheMediaType::Remote
            && self.media_server.as_deref().is_none_or(str::is_empty)
        {
            return Err(ConfigError::Invalid(
                "Cache media_server is required for the remote medium".to_string(),
            ));
        }

        Ok(())
    }

    /// Convert to runtime options
    pub fn to_options(&self) -> CacheOptions {
        let mut options = CacheOptions::new()
            .with_query_cache(self.query_cache_enabled)
            .with_table_cache(self.table_cache_enabled)
            .with_max_count_per_table(self.query_cache_max_count_per_table)
            .with_connection_timeout(self.connection_timeout_ms);
        options.set_query_cache_ttl(Duration::from_secs(self.query_cache_ttl_seconds));
        options.set_table_cache_ttl(Duration::from_secs(self.table_cache_ttl_seconds));
        options.media_type = self.media_type;
        options.media_server = self.media_server.clone();
        options
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            query_cache_enabled: false,
            table_cache_enabled: false,
            query_cache_ttl_seconds: DEFAULT_QUERY_CACHE_TTL.as_secs(),
            table_cache_ttl_seconds: DEFAULT_TABLE_CACHE_TTL.as_secs(),
            query_cache_max_count_per_table: DEFAULT_QUERY_CACHE_MAX_COUNT_PER_TABLE,
            media_type: CacheMediaType::Local,
            media_server: None,
            connection_timeout_ms: DEFAULT_CONNECTION_TIMEOUT_MS,
        }
    }
}

impl TableCacheEntry {
    /// TTL override, `None` when the default applies
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_minutes
            .filter(|minutes| *minutes > 0)
            .map(|minutes| Duration::from_secs(minutes.saturating_mul(60)))
    }
}

//! Runtime cache options
//!
//! `CacheOptions` is the in-process form of the `[cache]` section. TTLs are
//! kept as `Duration`s and the registry TTL is derived from them.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default lifetime of a query cache bucket (10 minutes)
pub const DEFAULT_QUERY_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// Default lifetime of a table cache snapshot (6 hours)
pub const DEFAULT_TABLE_CACHE_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Default number of cached queries kept per collection
pub const DEFAULT_QUERY_CACHE_MAX_COUNT_PER_TABLE: usize = 50;

/// Lower bound for key registry lifetime (1 day)
pub const MIN_REGISTRY_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default remote medium address
pub const DEFAULT_MEDIA_SERVER: &str = "redis://localhost:6379";

/// Default remote connection timeout in milliseconds
pub const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 5000;

/// Where cached values live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMediaType {
    /// In-process map with per-entry expiry
    #[default]
    Local,
    /// Remote key-value store (Redis)
    Remote,
}

/// Cache options for one data context
#[derive(Debug, Clone, PartialEq)]
pub struct CacheOptions {
    pub query_cache_enabled: bool,
    pub table_cache_enabled: bool,
    pub query_cache_max_count_per_table: usize,
    pub media_type: CacheMediaType,
    pub media_server: Option<String>,
    pub connection_timeout_ms: u64,
    query_cache_ttl: Duration,
    table_cache_ttl: Duration,
    max_registry_ttl: Duration,
}

impl CacheOptions {
    /// Local-medium options with both tiers disabled
    pub fn new() -> Self {
        Self {
            query_cache_enabled: false,
            table_cache_enabled: false,
            query_cache_max_count_per_table: DEFAULT_QUERY_CACHE_MAX_COUNT_PER_TABLE,
            media_type: CacheMediaType::Local,
            media_server: None,
            connection_timeout_ms: DEFAULT_CONNECTION_TIMEOUT_MS,
            query_cache_ttl: DEFAULT_QUERY_CACHE_TTL,
            table_cache_ttl: DEFAULT_TABLE_CACHE_TTL,
            max_registry_ttl: MIN_REGISTRY_TTL,
        }
    }

    pub fn with_query_cache(mut self, enabled: bool) -> Self {
        self.query_cache_enabled = enabled;
        self
    }

    pub fn with_table_cache(mut self, enabled: bool) -> Self {
        self.table_cache_enabled = enabled;
        self
    }

    pub fn with_query_cache_ttl(mut self, ttl: Duration) -> Self {
        self.set_query_cache_ttl(ttl);
        self
    }

    pub fn with_table_cache_ttl(mut self, ttl: Duration) -> Self {
        self.set_table_cache_ttl(ttl);
        self
    }

    pub fn with_max_count_per_table(mut self, max_count: usize) -> Self {
        self.query_cache_max_count_per_table = max_count;
        self
    }

    /// Switch to the remote medium at `server`
    pub fn with_remote_media(mut self, server: impl Into<String>) -> Self {
        self.media_type = CacheMediaType::Remote;
        self.media_server = Some(server.into());
        self
    }

    pub fn with_connection_timeout(mut self, timeout_ms: u64) -> Self {
        self.connection_timeout_ms = timeout_ms;
        self
    }

    /// Set the query cache TTL. Zero restores the default.
    pub fn set_query_cache_ttl(&mut self, ttl: Duration) {
        self.query_cache_ttl = if ttl.is_zero() {
            DEFAULT_QUERY_CACHE_TTL
        } else {
            ttl
        };
        self.recompute_registry_ttl();
    }

    /// Set the table cache TTL. Zero restores the default.
    pub fn set_table_cache_ttl(&mut self, ttl: Duration) {
        self.table_cache_ttl = if ttl.is_zero() {
            DEFAULT_TABLE_CACHE_TTL
        } else {
            ttl
        };
        self.recompute_registry_ttl();
    }

    pub fn query_cache_ttl(&self) -> Duration {
        self.query_cache_ttl
    }

    pub fn table_cache_ttl(&self) -> Duration {
        self.table_cache_ttl
    }

    /// Lifetime of key registries: never shorter than what they index
    pub fn max_registry_ttl(&self) -> Duration {
        self.max_registry_ttl
    }

    /// Remote address, falling back to the local default server
    pub fn media_server_or_default(&self) -> &str {
        self.media_server
            .as_deref()
            .filter(|server| !server.is_empty())
            .unwrap_or(DEFAULT_MEDIA_SERVER)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    fn recompute_registry_ttl(&mut self) {
        self.max_registry_ttl = MIN_REGISTRY_TTL
            .max(self.query_cache_ttl)
            .max(self.table_cache_ttl);
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self::new()
    }
}

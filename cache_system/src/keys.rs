//! Cache key scheme
//!
//! All keys are plain strings so the same layout works on every medium.

use std::time::Duration;

/// Prefix of a query cache bucket
pub const QUERY_CACHE_PREFIX: &str = "QueryCache__";

/// Prefix of a table cache snapshot
pub const TABLE_CACHE_PREFIX: &str = "TableCache_";

/// Prefix of the per-database query cache key registry
pub const QUERY_CACHE_KEYS_PREFIX: &str = "QueryCacheKeys__";

/// Prefix of the per-database table cache key registry
pub const TABLE_CACHE_KEYS_PREFIX: &str = "TableCacheKeys__";

/// Prefix of the table scan marker
pub const TABLE_SCANNING_PREFIX: &str = "CacheScanning_";

/// How long a scan marker may outlive a crashed population
pub const SCAN_FLAG_TTL: Duration = Duration::from_secs(30 * 60);

/// `QueryCache__<collection>`
pub fn query_cache_key(collection_name: &str) -> String {
    format!("{}{}", QUERY_CACHE_PREFIX, collection_name)
}

/// `TableCache_<database>_<collection>`
pub fn table_cache_key(database_name: &str, collection_name: &str) -> String {
    format!("{}{}_{}", TABLE_CACHE_PREFIX, database_name, collection_name)
}

/// `QueryCacheKeys__<database>`
pub fn query_cache_registry_key(database_name: &str) -> String {
    format!("{}{}", QUERY_CACHE_KEYS_PREFIX, database_name)
}

/// `TableCacheKeys__<database>`
pub fn table_cache_registry_key(database_name: &str) -> String {
    format!("{}{}", TABLE_CACHE_KEYS_PREFIX, database_name)
}

/// `CacheScanning_<collection>`
pub fn scan_flag_key(collection_name: &str) -> String {
    format!("{}{}", TABLE_SCANNING_PREFIX, collection_name)
}

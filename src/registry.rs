//! Key registries
//!
//! A registry remembers every collection key a tier has written for one
//! database, so the whole tier can be flushed without scanning the medium.

use cache_system::{CacheError, CacheManager, KeyedLocks};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Set of cache keys persisted under a single registry key
#[derive(Debug, Clone)]
pub struct KeyRegistry {
    cache: Arc<CacheManager>,
    registry_key: String,
    locks: Arc<KeyedLocks>,
}

impl KeyRegistry {
    pub fn new(cache: Arc<CacheManager>, registry_key: String, locks: Arc<KeyedLocks>) -> Self {
        Self {
            cache,
            registry_key,
            locks,
        }
    }

    pub fn registry_key(&self) -> &str {
        &self.registry_key
    }

    /// Record `key` and refresh the registry lifetime to `ttl`
    pub async fn register(&self, key: &str, ttl: Duration) -> Result<(), CacheError> {
        let _guard = self.locks.lock(&self.registry_key).await;

        let mut keys: BTreeSet<String> = self.cache.get(&self.registry_key).await?;
        keys.insert(key.to_string());
        self.cache.put(&self.registry_key, &keys, ttl).await
    }

    /// Every key registered so far
    pub async fn keys(&self) -> Result<BTreeSet<String>, CacheError> {
        self.cache.get(&self.registry_key).await
    }

    /// Delete every registered key, then the registry itself
    pub async fn flush(&self) -> Result<usize, CacheError> {
        let _guard = self.locks.lock(&self.registry_key).await;

        let keys: BTreeSet<String> = self.cache.get(&self.registry_key).await?;
        for key in &keys {
            self.cache.delete(key).await?;
        }
        self.cache.delete(&self.registry_key).await?;

        crate::debug_log!(
            "Flushed {} keys registered under {}",
            keys.len(),
            self.registry_key
        );
        Ok(keys.len())
    }
}

//! Query cache (first-level cache)
//!
//! Results are grouped per collection: one bucket holds every cached query
//! of a collection, keyed by query fingerprint. A write to the collection
//! drops the whole bucket. Buckets are bounded; when full, the fingerprint
//! inserted first is evicted.
//!
//! ```text
//! QueryCache__orders -> {
//!     <sha256(query)>          -> [ ... ],
//!     <sha256(query_a|b|c)>    -> 42,
//! }
//! ```

use crate::errors::CacheHausError;
use crate::registry::KeyRegistry;
use cache_system::{CacheManager, KeyedLocks, keys};
use config::CacheOptions;
use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use store_object::QueryContext;

/// Fingerprint -> cached result, in insertion order
pub type QueryBucket = IndexMap<String, Value>;

/// Query cache for one database
#[derive(Debug)]
pub struct QueryCacheManager {
    cache: Arc<CacheManager>,
    options: Arc<CacheOptions>,
    registry: KeyRegistry,
    locks: Arc<KeyedLocks>,
}

impl QueryCacheManager {
    pub fn new(
        database_name: &str,
        cache: Arc<CacheManager>,
        options: Arc<CacheOptions>,
        locks: Arc<KeyedLocks>,
    ) -> Self {
        let registry = KeyRegistry::new(
            cache.clone(),
            keys::query_cache_registry_key(database_name),
            locks.clone(),
        );

        Self {
            cache,
            options,
            registry,
            locks,
        }
    }

    /// Hex SHA-256 of the query text and its ordered parameters
    pub fn fingerprint(ctx: &QueryContext) -> String {
        hex::encode(Sha256::digest(ctx.cache_identity().as_bytes()))
    }

    /// Cache `value` as the result of the query described by `ctx`
    pub async fn set_cache_data<V: Serialize>(
        &self,
        ctx: &QueryContext,
        value: &V,
    ) -> Result<(), CacheHausError> {
        let bucket_key = keys::query_cache_key(ctx.collection_name());
        let fingerprint = Self::fingerprint(ctx);
        let value = serde_json::to_value(value).map_err(cache_system::CacheError::from)?;
        let max_entries = self.options.query_cache_max_count_per_table.max(1);

        {
            let _guard = self.locks.lock(&bucket_key).await;

            let mut bucket: QueryBucket = self.cache.get(&bucket_key).await?;
            if !bucket.contains_key(&fingerprint) {
                while bucket.len() >= max_entries {
                    bucket.shift_remove_index(0);
                }
            }
            bucket.insert(fingerprint, value);

            self.cache
                .put(&bucket_key, &bucket, self.options.query_cache_ttl())
                .await?;
        }

        self.registry
            .register(&bucket_key, self.options.max_registry_ttl())
            .await?;
        Ok(())
    }

    /// Look up the result of the query described by `ctx`. Marks the
    /// context as served from cache on a hit.
    pub async fn get_entities_from_cache<T: DeserializeOwned>(
        &self,
        ctx: &QueryContext,
    ) -> Result<Option<T>, CacheHausError> {
        let bucket_key = keys::query_cache_key(ctx.collection_name());
        let Some(bucket) = self.cache.try_get::<QueryBucket>(&bucket_key).await? else {
            return Ok(None);
        };

        match bucket.get(&Self::fingerprint(ctx)) {
            Some(value) => {
                let result = serde_json::from_value(value.clone())
                    .map_err(cache_system::CacheError::from)?;
                ctx.mark_from_cache();
                crate::trace_log!("Query cache hit in {}", bucket_key);
                Ok(Some(result))
            }
            None => Ok(None),
        }
    }

    /// Drop every cached query of one collection
    pub async fn flush_collection_cache(&self, collection_name: &str) -> Result<(), CacheHausError> {
        let bucket_key = keys::query_cache_key(collection_name);
        let _guard = self.locks.lock(&bucket_key).await;
        self.cache.delete(&bucket_key).await?;
        Ok(())
    }

    /// Drop every query cache bucket of this database
    pub async fn flush_all_cache(&self) -> Result<usize, CacheHausError> {
        Ok(self.registry.flush().await?)
    }

    /// Number of cached queries for a collection
    pub async fn bucket_len(&self, collection_name: &str) -> Result<usize, CacheHausError> {
        let bucket: QueryBucket = self
            .cache
            .get(&keys::query_cache_key(collection_name))
            .await?;
        Ok(bucket.len())
    }

    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(query: &str) -> QueryContext {
        QueryContext::new("orders", query)
    }

    #[test]
    fn test_fingerprint_is_stable_hex() {
        let first = QueryCacheManager::fingerprint(&ctx("SELECT 1"));
        let second = QueryCacheManager::fingerprint(&ctx("SELECT 1"));
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_depends_on_parameter_order() {
        let a = ctx("q").with_parameter(1).with_parameter(2);
        let b = ctx("q").with_parameter(2).with_parameter(1);
        assert_ne!(
            QueryCacheManager::fingerprint(&a),
            QueryCacheManager::fingerprint(&b)
        );
    }

    #[tokio::test]
    async fn test_updating_existing_fingerprint_does_not_evict() {
        let options = CacheOptions::new()
            .with_query_cache(true)
            .with_max_count_per_table(2);
        let manager = QueryCacheManager::new(
            "shop",
            Arc::new(CacheManager::local()),
            Arc::new(options),
            Arc::new(KeyedLocks::new()),
        );

        manager.set_cache_data(&ctx("q1"), &1).await.unwrap();
        manager.set_cache_data(&ctx("q2"), &2).await.unwrap();
        manager.set_cache_data(&ctx("q1"), &10).await.unwrap();

        assert_eq!(manager.bucket_len("orders").await.unwrap(), 2);
        let q1: Option<i32> = manager.get_entities_from_cache(&ctx("q1")).await.unwrap();
        let q2: Option<i32> = manager.get_entities_from_cache(&ctx("q2")).await.unwrap();
        assert_eq!(q1, Some(10));
        assert_eq!(q2, Some(2));
    }
}

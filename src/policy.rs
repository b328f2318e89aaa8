//! Table cache registrations
//!
//! Which entity types get a table cache snapshot, and for how long. The
//! table is filled at configuration time and consulted by collection name.

use config::TableCacheEntry;
use std::collections::HashMap;
use std::time::Duration;
use store_object::CacheEntity;

/// Table cache settings for one collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCachePolicy {
    /// Snapshot lifetime; `None` uses the default table cache TTL
    pub ttl: Option<Duration>,
}

impl TableCachePolicy {
    /// Resolve the effective snapshot lifetime
    pub fn ttl_or(&self, default_ttl: Duration) -> Duration {
        self.ttl.filter(|ttl| !ttl.is_zero()).unwrap_or(default_ttl)
    }
}

/// Registration table: collection name -> table cache policy
#[derive(Debug, Clone, Default)]
pub struct TableCachePolicies {
    policies: HashMap<String, TableCachePolicy>,
}

impl TableCachePolicies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable table caching for `T`
    pub fn register<T: CacheEntity>(&mut self, ttl: Option<Duration>) -> &mut Self {
        self.register_collection(T::collection_name(), ttl)
    }

    /// Enable table caching for a collection by name
    pub fn register_collection(&mut self, collection: &str, ttl: Option<Duration>) -> &mut Self {
        self.policies
            .insert(collection.to_string(), TableCachePolicy { ttl });
        self
    }

    pub fn with<T: CacheEntity>(mut self, ttl: Option<Duration>) -> Self {
        self.register::<T>(ttl);
        self
    }

    /// Build from `[[table_cache]]` entries
    pub fn from_entries(entries: &[TableCacheEntry]) -> Self {
        let mut policies = Self::new();
        for entry in entries {
            policies.register_collection(&entry.collection, entry.ttl());
        }
        policies
    }

    /// Policy for `T`, `None` when `T` is not table-cached
    pub fn policy<T: CacheEntity>(&self) -> Option<TableCachePolicy> {
        self.policy_for(T::collection_name())
    }

    pub fn policy_for(&self, collection: &str) -> Option<TableCachePolicy> {
        self.policies.get(collection).copied()
    }

    pub fn is_enabled<T: CacheEntity>(&self) -> bool {
        self.policies.contains_key(T::collection_name())
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

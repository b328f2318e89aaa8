//! Table cache (second-level cache)
//!
//! Keeps a full snapshot of every registered collection and answers filtered
//! reads from memory. Snapshots are only ever created by a background
//! population task; writes patch an existing snapshot in place.
//!
//! Population is single-flight per collection. A scan flag in the medium
//! marks a population as in flight, and one mutex per manager serializes
//! the populations themselves.

use crate::errors::CacheHausError;
use crate::policy::TableCachePolicies;
use crate::registry::KeyRegistry;
use cache_system::{CacheManager, CacheValue, KeyedLocks, keys};
use config::CacheOptions;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use store_object::{CacheEntity, CollectionScanner, EntityFilter, QueryContext};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

/// Table cache for one database
pub struct TableCacheManager<S: CollectionScanner> {
    database_name: Arc<str>,
    options: Arc<CacheOptions>,
    policies: Arc<TableCachePolicies>,
    scanner: Arc<S>,
    cache: Arc<CacheManager>,
    locks: Arc<KeyedLocks>,
    population_lock: Arc<AsyncMutex<()>>,
    registry: KeyRegistry,
}

impl<S: CollectionScanner> Clone for TableCacheManager<S> {
    fn clone(&self) -> Self {
        Self {
            database_name: self.database_name.clone(),
            options: self.options.clone(),
            policies: self.policies.clone(),
            scanner: self.scanner.clone(),
            cache: self.cache.clone(),
            locks: self.locks.clone(),
            population_lock: self.population_lock.clone(),
            registry: self.registry.clone(),
        }
    }
}

impl<S: CollectionScanner> Debug for TableCacheManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableCacheManager")
            .field("database_name", &self.database_name)
            .field("policies", &self.policies)
            .field("registry", &self.registry.registry_key())
            .finish()
    }
}

impl<S: CollectionScanner> TableCacheManager<S> {
    pub fn new(
        database_name: &str,
        cache: Arc<CacheManager>,
        options: Arc<CacheOptions>,
        policies: Arc<TableCachePolicies>,
        scanner: Arc<S>,
        locks: Arc<KeyedLocks>,
    ) -> Self {
        let registry = KeyRegistry::new(
            cache.clone(),
            keys::table_cache_registry_key(database_name),
            locks.clone(),
        );

        Self {
            database_name: Arc::from(database_name),
            options,
            policies,
            scanner,
            cache,
            locks,
            population_lock: Arc::new(AsyncMutex::new(())),
            registry,
        }
    }

    /// Snapshot key of `T`'s collection
    pub fn snapshot_key<T: CacheEntity>(&self) -> String {
        keys::table_cache_key(&self.database_name, T::collection_name())
    }

    /// Lifetime of `T`'s snapshot: the registered override or the table cache TTL
    pub fn snapshot_ttl<T: CacheEntity>(&self) -> Duration {
        let default_ttl = self.options.table_cache_ttl();
        self.policies
            .policy::<T>()
            .map_or(default_ttl, |policy| policy.ttl_or(default_ttl))
    }

    pub fn is_enabled<T: CacheEntity>(&self) -> bool {
        self.policies.is_enabled::<T>()
    }

    /// Answer a filtered read from the snapshot.
    ///
    /// Returns `None` when `T` is not table-cached or no snapshot exists yet;
    /// in the latter case a background population is started.
    pub async fn get_entities_from_cache<T, F>(
        &self,
        ctx: &QueryContext,
        filter: &F,
    ) -> Result<Option<Vec<T>>, CacheHausError>
    where
        T: CacheEntity,
        F: EntityFilter<T> + ?Sized,
    {
        filter.validate()?;

        if !self.is_enabled::<T>() {
            return Ok(None);
        }

        match self.snapshot::<T>().await? {
            Some(snapshot) => {
                ctx.mark_from_cache();
                Ok(Some(
                    snapshot
                        .into_iter()
                        .filter(|entity| filter.matches(entity))
                        .collect(),
                ))
            }
            None => {
                self.start_population::<T>().await?;
                Ok(None)
            }
        }
    }

    /// Start filling `T`'s snapshot in the background.
    ///
    /// Returns `None` when `T` is not table-cached or another population is
    /// already in flight for the collection.
    pub async fn start_population<T: CacheEntity>(
        &self,
    ) -> Result<Option<JoinHandle<()>>, CacheHausError> {
        if !self.is_enabled::<T>() {
            return Ok(None);
        }

        let flag_key = keys::scan_flag_key(T::collection_name());
        {
            let _guard = self.locks.lock(&flag_key).await;
            if self.cache.exists(&flag_key).await? {
                crate::trace_log!("Population of {} already in flight", T::collection_name());
                return Ok(None);
            }
            self.cache.put(&flag_key, &true, keys::SCAN_FLAG_TTL).await?;
        }

        let this = self.clone();
        let handle = tokio::spawn(async move {
            // A panic anywhere in the population surfaces here as a JoinError
            let population = {
                let this = this.clone();
                tokio::spawn(async move {
                    let _serial = this.population_lock.lock().await;
                    this.populate::<T>().await
                })
            };

            match population.await {
                Ok(Ok(Some(count))) => tracing::debug!(
                    "Table cache for {} populated with {} entities",
                    T::collection_name(),
                    count
                ),
                Ok(Ok(None)) => {}
                Ok(Err(e)) => tracing::warn!(
                    "Table cache population for {} failed: {}",
                    T::collection_name(),
                    e
                ),
                Err(e) => tracing::warn!(
                    "Table cache population for {} aborted: {}",
                    T::collection_name(),
                    e
                ),
            }

            if let Err(e) = this.cache.delete(&flag_key).await {
                tracing::warn!("Failed to clear scan flag {}: {}", flag_key, e);
            }
        });

        Ok(Some(handle))
    }

    /// Scan and persist `T`'s snapshot unless another population got there first
    async fn populate<T: CacheEntity>(&self) -> Result<Option<usize>, CacheHausError> {
        let key = self.snapshot_key::<T>();
        if self.cache.exists(&key).await? {
            return Ok(None);
        }

        tracing::debug!("Scanning {} for the table cache", T::collection_name());
        let entities: Vec<T> = self
            .scanner
            .scan_collection::<T>()
            .await
            .map_err(CacheHausError::Source)?;

        let count = entities.len();
        self.persist(&key, &entities, self.snapshot_ttl::<T>()).await?;
        Ok(Some(count))
    }

    async fn persist<V: CacheValue>(
        &self,
        key: &str,
        snapshot: &V,
        ttl: Duration,
    ) -> Result<(), CacheHausError> {
        {
            let _guard = self.locks.lock(key).await;
            self.cache.put(key, snapshot, ttl).await?;
        }
        self.registry
            .register(key, ttl.max(self.options.max_registry_ttl()))
            .await?;
        Ok(())
    }

    /// Apply `change` to an existing snapshot and re-persist it if it reports
    /// a modification. Never creates a snapshot.
    async fn modify_snapshot<T, C>(&self, change: C) -> Result<bool, CacheHausError>
    where
        T: CacheEntity,
        C: FnOnce(&mut Vec<T>) -> bool,
    {
        if !self.is_enabled::<T>() {
            return Ok(false);
        }

        let key = self.snapshot_key::<T>();
        let ttl = self.snapshot_ttl::<T>();
        {
            let _guard = self.locks.lock(&key).await;
            let Some(mut snapshot) = self.cache.try_get::<Vec<T>>(&key).await? else {
                return Ok(false);
            };
            if !change(&mut snapshot) {
                return Ok(false);
            }
            self.cache.put(&key, &snapshot, ttl).await?;
        }

        self.registry
            .register(&key, ttl.max(self.options.max_registry_ttl()))
            .await?;
        Ok(true)
    }

    /// Append `entity` to the snapshot
    pub async fn add_cache<T: CacheEntity>(&self, entity: &T) -> Result<bool, CacheHausError> {
        self.modify_snapshot(|snapshot: &mut Vec<T>| {
            snapshot.push(entity.clone());
            true
        })
        .await
    }

    /// Append `entities` to the snapshot, in order
    pub async fn add_cache_many<T: CacheEntity>(
        &self,
        entities: &[T],
    ) -> Result<bool, CacheHausError> {
        if entities.is_empty() {
            return Ok(false);
        }

        self.modify_snapshot(|snapshot: &mut Vec<T>| {
            snapshot.extend_from_slice(entities);
            true
        })
        .await
    }

    /// Replace the first entity matching `filter` with `entity`
    pub async fn update_cache<T, F>(&self, entity: &T, filter: &F) -> Result<bool, CacheHausError>
    where
        T: CacheEntity,
        F: EntityFilter<T> + ?Sized,
    {
        filter.validate()?;

        self.modify_snapshot(|snapshot: &mut Vec<T>| {
            match snapshot.iter().position(|e| filter.matches(e)) {
                Some(index) => {
                    snapshot[index] = entity.clone();
                    true
                }
                None => false,
            }
        })
        .await
    }

    /// Remove the first entity equal to `entity`
    pub async fn delete_cache<T: CacheEntity>(&self, entity: &T) -> Result<bool, CacheHausError> {
        self.modify_snapshot(|snapshot: &mut Vec<T>| {
            match snapshot.iter().position(|e| e == entity) {
                Some(index) => {
                    snapshot.remove(index);
                    true
                }
                None => false,
            }
        })
        .await
    }

    /// Remove every entity matching `filter`
    pub async fn delete_cache_where<T, F>(&self, filter: &F) -> Result<bool, CacheHausError>
    where
        T: CacheEntity,
        F: EntityFilter<T> + ?Sized,
    {
        filter.validate()?;

        self.modify_snapshot(|snapshot: &mut Vec<T>| {
            let before = snapshot.len();
            snapshot.retain(|e| !filter.matches(e));
            snapshot.len() != before
        })
        .await
    }

    /// Drop the snapshot of one collection
    pub async fn flush_collection_cache(&self, collection_name: &str) -> Result<(), CacheHausError> {
        let key = keys::table_cache_key(&self.database_name, collection_name);
        let _guard = self.locks.lock(&key).await;
        self.cache.delete(&key).await?;
        Ok(())
    }

    /// Drop every snapshot of this database
    pub async fn flush_all_cache(&self) -> Result<usize, CacheHausError> {
        Ok(self.registry.flush().await?)
    }

    /// Current snapshot of `T`'s collection, if any
    pub async fn snapshot<T: CacheEntity>(&self) -> Result<Option<Vec<T>>, CacheHausError> {
        Ok(self
            .cache
            .try_get::<Vec<T>>(&self.snapshot_key::<T>())
            .await?)
    }

    /// Whether a population of `T`'s collection is in flight
    pub async fn is_populating<T: CacheEntity>(&self) -> Result<bool, CacheHausError> {
        Ok(self
            .cache
            .exists(&keys::scan_flag_key(T::collection_name()))
            .await?)
    }

    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }
}

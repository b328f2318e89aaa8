//! Cache orchestrator
//!
//! `DbCacheManager` is the contract the query executor talks to. Reads go
//! table cache -> query cache -> source; writes drop the collection's query
//! cache bucket and patch its table cache snapshot.

use crate::errors::CacheHausError;
use crate::policy::TableCachePolicies;
use crate::query_cache::QueryCacheManager;
use crate::table_cache::TableCacheManager;
use cache_system::{CacheManager, KeyedLocks};
use config::{CacheOptions, ConfigError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use store_object::{CacheEntity, CollectionScanner, EntityFilter, QueryContext};

/// Both cache tiers of one database
pub struct DbCacheManager<S: CollectionScanner> {
    database_name: String,
    options: Arc<CacheOptions>,
    cache: Arc<CacheManager>,
    query_cache: Option<QueryCacheManager>,
    table_cache: Option<TableCacheManager<S>>,
}

impl<S: CollectionScanner> Debug for DbCacheManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbCacheManager")
            .field("database_name", &self.database_name)
            .field("options", &self.options)
            .field("cache", &self.cache)
            .field("query_cache", &self.query_cache)
            .field("table_cache", &self.table_cache)
            .finish()
    }
}

impl<S: CollectionScanner> DbCacheManager<S> {
    /// Create the tiers enabled in `options` on a medium of their own
    pub fn new(
        database_name: impl Into<String>,
        options: CacheOptions,
        policies: TableCachePolicies,
        scanner: S,
    ) -> Result<Self, CacheHausError> {
        let cache = Arc::new(CacheManager::new(&options)?);
        Self::with_cache_manager(database_name, options, policies, scanner, cache)
    }

    /// Create the tiers on an existing, possibly shared, medium
    pub fn with_cache_manager(
        database_name: impl Into<String>,
        options: CacheOptions,
        policies: TableCachePolicies,
        scanner: S,
        cache: Arc<CacheManager>,
    ) -> Result<Self, CacheHausError> {
        let database_name = database_name.into();
        if database_name.is_empty() {
            return Err(ConfigError::Invalid("Database name cannot be empty".to_string()).into());
        }

        let options = Arc::new(options);
        let locks = Arc::new(KeyedLocks::new());

        let query_cache = options.query_cache_enabled.then(|| {
            QueryCacheManager::new(&database_name, cache.clone(), options.clone(), locks.clone())
        });
        let table_cache = options.table_cache_enabled.then(|| {
            TableCacheManager::new(
                &database_name,
                cache.clone(),
                options.clone(),
                Arc::new(policies),
                Arc::new(scanner),
                locks.clone(),
            )
        });

        crate::debug_log!(
            "Cache opened for {} (query cache: {}, table cache: {}, media: {:?})",
            database_name,
            query_cache.is_some(),
            table_cache.is_some(),
            cache.media_type()
        );

        Ok(Self {
            database_name,
            options,
            cache,
            query_cache,
            table_cache,
        })
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    pub fn cache_manager(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    pub fn query_cache(&self) -> Result<&QueryCacheManager, CacheHausError> {
        self.query_cache
            .as_ref()
            .ok_or(CacheHausError::NotConfigured("Query cache"))
    }

    pub fn table_cache(&self) -> Result<&TableCacheManager<S>, CacheHausError> {
        self.table_cache
            .as_ref()
            .ok_or(CacheHausError::NotConfigured("Table cache"))
    }

    // ========================================
    // Reads
    // ========================================

    /// First entity matching `filter`
    pub async fn get_entity<T, F, Q, Fut>(
        &self,
        ctx: &QueryContext,
        filter: &F,
        query: Q,
    ) -> Result<Option<T>, CacheHausError>
    where
        T: CacheEntity,
        F: EntityFilter<T> + ?Sized,
        Q: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Option<T>>>,
    {
        self.read_through(ctx, filter, |matches| matches.into_iter().next(), query)
            .await
    }

    /// Every entity matching `filter`
    pub async fn get_entities<T, F, Q, Fut>(
        &self,
        ctx: &QueryContext,
        filter: &F,
        query: Q,
    ) -> Result<Vec<T>, CacheHausError>
    where
        T: CacheEntity,
        F: EntityFilter<T> + ?Sized,
        Q: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Vec<T>>>,
    {
        self.read_through(ctx, filter, |matches| matches, query).await
    }

    /// Number of entities matching `filter`
    pub async fn get_count<T, F, Q, Fut>(
        &self,
        ctx: &QueryContext,
        filter: &F,
        query: Q,
    ) -> Result<u64, CacheHausError>
    where
        T: CacheEntity,
        F: EntityFilter<T> + ?Sized,
        Q: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<u64>>,
    {
        self.read_through(ctx, filter, |matches: Vec<T>| matches.len() as u64, query)
            .await
    }

    async fn read_through<T, F, R, P, Q, Fut>(
        &self,
        ctx: &QueryContext,
        filter: &F,
        project: P,
        query: Q,
    ) -> Result<R, CacheHausError>
    where
        T: CacheEntity,
        F: EntityFilter<T> + ?Sized,
        R: Serialize + DeserializeOwned,
        P: FnOnce(Vec<T>) -> R,
        Q: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<R>>,
    {
        ctx.reset_from_cache();

        if let Some(table_cache) = &self.table_cache {
            if let Some(matches) = table_cache.get_entities_from_cache(ctx, filter).await? {
                return Ok(project(matches));
            }
        }

        if let Some(query_cache) = &self.query_cache {
            if let Some(cached) = query_cache.get_entities_from_cache::<R>(ctx).await? {
                return Ok(cached);
            }
        }

        let result = query().await.map_err(CacheHausError::Source)?;

        if let Some(query_cache) = &self.query_cache {
            query_cache.set_cache_data(ctx, &result).await?;
        }
        Ok(result)
    }

    // ========================================
    // Writes
    // ========================================

    async fn invalidate_query_cache<T: CacheEntity>(&self) -> Result<(), CacheHausError> {
        if let Some(query_cache) = &self.query_cache {
            query_cache
                .flush_collection_cache(T::collection_name())
                .await?;
        }
        Ok(())
    }

    /// Record an inserted entity
    pub async fn add<T: CacheEntity>(&self, entity: &T) -> Result<(), CacheHausError> {
        self.invalidate_query_cache::<T>().await?;
        if let Some(table_cache) = &self.table_cache {
            table_cache.add_cache(entity).await?;
        }
        Ok(())
    }

    /// Record a batch of inserted entities
    pub async fn add_many<T: CacheEntity>(&self, entities: &[T]) -> Result<(), CacheHausError> {
        self.invalidate_query_cache::<T>().await?;
        if let Some(table_cache) = &self.table_cache {
            table_cache.add_cache_many(entities).await?;
        }
        Ok(())
    }

    /// Record an update of the entity selected by `filter`
    pub async fn update<T, F>(&self, entity: &T, filter: &F) -> Result<(), CacheHausError>
    where
        T: CacheEntity,
        F: EntityFilter<T> + ?Sized,
    {
        self.invalidate_query_cache::<T>().await?;
        if let Some(table_cache) = &self.table_cache {
            table_cache.update_cache(entity, filter).await?;
        }
        Ok(())
    }

    /// Record a deleted entity
    pub async fn delete<T: CacheEntity>(&self, entity: &T) -> Result<(), CacheHausError> {
        self.invalidate_query_cache::<T>().await?;
        if let Some(table_cache) = &self.table_cache {
            table_cache.delete_cache(entity).await?;
        }
        Ok(())
    }

    /// Record deletion of every entity matching `filter`
    pub async fn delete_where<T, F>(&self, filter: &F) -> Result<(), CacheHausError>
    where
        T: CacheEntity,
        F: EntityFilter<T> + ?Sized,
    {
        self.invalidate_query_cache::<T>().await?;
        if let Some(table_cache) = &self.table_cache {
            table_cache.delete_cache_where(filter).await?;
        }
        Ok(())
    }

    // ========================================
    // Flushing
    // ========================================

    /// Drop everything both tiers hold for this database
    pub async fn flush_all_cache(&self) -> Result<(), CacheHausError> {
        if let Some(query_cache) = &self.query_cache {
            query_cache.flush_all_cache().await?;
        }
        if let Some(table_cache) = &self.table_cache {
            table_cache.flush_all_cache().await?;
        }
        Ok(())
    }

    /// Drop everything both tiers hold for one collection
    pub async fn flush_collection_cache(&self, collection_name: &str) -> Result<(), CacheHausError> {
        if let Some(query_cache) = &self.query_cache {
            query_cache.flush_collection_cache(collection_name).await?;
        }
        if let Some(table_cache) = &self.table_cache {
            table_cache.flush_collection_cache(collection_name).await?;
        }
        Ok(())
    }
}

//! Core CacheHaus functionality
//!
//! This module contains the CacheHaus context, the cache-management face of
//! a data context: it owns at most one cache manager per database and routes
//! reads through it when caching has been opened.

use std::future::Future;
use std::time::Duration;

use crate::errors::CacheHausError;
use crate::manager::DbCacheManager;
use crate::policy::TableCachePolicies;
use config::{AppConfig, CacheOptions};
use store_object::CollectionScanner;

/// Data context for one database, optionally backed by a cache manager
pub struct CacheHaus<S: CollectionScanner> {
    database_name: String,
    cache: Option<DbCacheManager<S>>,
}

impl<S: CollectionScanner> CacheHaus<S> {
    /// Create a context with caching closed
    pub fn new(database_name: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            cache: None,
        }
    }

    /// Build a context from configuration, opening the cache when either
    /// tier is enabled
    pub fn from_config(config: AppConfig, scanner: S) -> Result<Self, CacheHausError> {
        let mut haus = Self::new(config.database_name.clone());
        let options = config.cache.to_options();

        if options.query_cache_enabled || options.table_cache_enabled {
            let policies = TableCachePolicies::from_entries(&config.table_cache);
            let manager = DbCacheManager::new(config.database_name, options, policies, scanner)?;
            haus.open_cache(manager)?;
        }

        Ok(haus)
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// Install a cache manager. A context can only be opened once.
    pub fn open_cache(
        &mut self,
        manager: DbCacheManager<S>,
    ) -> Result<&DbCacheManager<S>, CacheHausError> {
        if self.cache.is_some() {
            return Err(CacheHausError::CacheAlreadyOpened(
                self.database_name.clone(),
            ));
        }

        Ok(&*self.cache.insert(manager))
    }

    /// Open caching on an in-process medium
    pub fn open_local_cache(
        &mut self,
        query_cache_enabled: bool,
        table_cache_enabled: bool,
        query_cache_ttl: Duration,
        table_cache_ttl: Duration,
        policies: TableCachePolicies,
        scanner: S,
    ) -> Result<&DbCacheManager<S>, CacheHausError> {
        let options = CacheOptions::new()
            .with_query_cache(query_cache_enabled)
            .with_table_cache(table_cache_enabled)
            .with_query_cache_ttl(query_cache_ttl)
            .with_table_cache_ttl(table_cache_ttl);

        self.open_with_options(options, policies, scanner)
    }

    /// Open caching on a Redis medium at `address`
    pub fn open_remote_cache(
        &mut self,
        address: &str,
        query_cache_enabled: bool,
        table_cache_enabled: bool,
        policies: TableCachePolicies,
        scanner: S,
    ) -> Result<&DbCacheManager<S>, CacheHausError> {
        let options = CacheOptions::new()
            .with_query_cache(query_cache_enabled)
            .with_table_cache(table_cache_enabled)
            .with_remote_media(address);

        self.open_with_options(options, policies, scanner)
    }

    fn open_with_options(
        &mut self,
        options: CacheOptions,
        policies: TableCachePolicies,
        scanner: S,
    ) -> Result<&DbCacheManager<S>, CacheHausError> {
        // Checked before building the manager so no Redis client is created
        if self.cache.is_some() {
            return Err(CacheHausError::CacheAlreadyOpened(
                self.database_name.clone(),
            ));
        }

        let manager = DbCacheManager::new(self.database_name.clone(), options, policies, scanner)?;
        self.open_cache(manager)
    }

    pub fn is_cache_opened(&self) -> bool {
        self.cache.is_some()
    }

    /// The installed cache manager
    pub fn cache_manager(&self) -> Result<&DbCacheManager<S>, CacheHausError> {
        self.cache
            .as_ref()
            .ok_or(CacheHausError::NotConfigured("Cache manager"))
    }

    /// Run `cached` against the cache manager when one is installed,
    /// otherwise run `query` directly
    ///
    /// ```rust,ignore
    /// let orders = haus
    ///     .cache_safe_execute(
    ///         |cache, query| cache.get_entities(&ctx, &filter, query),
    ///         || store.load_orders(),
    ///     )
    ///     .await?;
    /// ```
    pub async fn cache_safe_execute<'a, R, C, CF, Q, QF>(
        &'a self,
        cached: C,
        query: Q,
    ) -> Result<R, CacheHausError>
    where
        C: FnOnce(&'a DbCacheManager<S>, Q) -> CF,
        CF: Future<Output = Result<R, CacheHausError>>,
        Q: FnOnce() -> QF,
        QF: Future<Output = anyhow::Result<R>>,
    {
        match &self.cache {
            Some(manager) => cached(manager, query).await,
            None => query().await.map_err(CacheHausError::Source),
        }
    }

    /// Drop everything cached for this database
    pub async fn flush_all_cache(&self) -> Result<(), CacheHausError> {
        self.cache_manager()?.flush_all_cache().await
    }

    /// Drop everything cached for one collection
    pub async fn flush_collection_cache(&self, collection_name: &str) -> Result<(), CacheHausError> {
        self.cache_manager()?
            .flush_collection_cache(collection_name)
            .await
    }

    /// Check cache medium health
    pub async fn health_check(&self) -> Result<(), CacheHausError> {
        self.cache_manager()?.cache_manager().ping().await?;
        Ok(())
    }
}

//! # CacheHaus
//!
//! A two-tier cache engine for ORM/ODM data layers. The query cache keeps
//! recent query results per collection; the table cache keeps a full,
//! incrementally maintained snapshot of selected collections. Both tiers
//! live on an in-process medium or on Redis.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cachehaus::prelude::*;
//! use std::time::Duration;
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! pub struct Order {
//!     pub id: i64,
//!     pub status: String,
//! }
//!
//! impl CacheEntity for Order {
//!     fn collection_name() -> &'static str {
//!         "orders"
//!     }
//! }
//!
//! struct Store;
//!
//! #[async_trait]
//! impl CollectionScanner for Store {
//!     async fn scan_collection<T: CacheEntity>(&self) -> anyhow::Result<Vec<T>> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), CacheHausError> {
//!     let options = CacheOptions::new()
//!         .with_query_cache(true)
//!         .with_table_cache(true)
//!         .with_query_cache_ttl(Duration::from_secs(300));
//!     let policies = TableCachePolicies::new().with::<Order>(None);
//!
//!     let cache = DbCacheManager::new("shop", options, policies, Store)?;
//!
//!     let ctx = QueryContext::new("orders", "SELECT * FROM orders WHERE status = $1")
//!         .with_parameter("shipped");
//!     let filter = QueryFilter::eq("status", json!("shipped"));
//!
//!     let shipped: Vec<Order> = cache
//!         .get_entities(&ctx, &filter, || async { anyhow::Ok(Vec::new()) })
//!         .await?;
//!     println!("{} shipped orders (cached: {})", shipped.len(), ctx.is_from_cache());
//!
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod core;
pub mod errors;
pub mod manager;
pub mod policy;
pub mod prelude;
pub mod query_cache;
pub mod registry;
pub mod table_cache;

// Re-export the main public types for convenience
pub use core::CacheHaus;
pub use errors::CacheHausError;
pub use manager::DbCacheManager;
pub use policy::{TableCachePolicies, TableCachePolicy};
pub use query_cache::QueryCacheManager;
pub use registry::KeyRegistry;
pub use table_cache::TableCacheManager;

// Re-export centralized config
pub use config::{AppConfig, CacheConfig, CacheMediaType, CacheOptions, TableCacheEntry};

// Re-export internal crates used in the public API
pub use cache_system;
pub use store_object;

// Re-export external dependencies used in public API
pub use async_trait;
pub use chrono;

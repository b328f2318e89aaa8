//! Convenience re-exports for common CacheHaus usage
//!
//! This prelude module re-exports the most commonly used items from the CacheHaus workspace,
//! making it easier to import everything you need with a single use statement.
//!
//! # Example
//!
//! ```rust
//! use cachehaus::prelude::*;
//!
//! // Now you have access to all the common CacheHaus types and traits
//! ```

// Core CacheHaus components
pub use crate::core::CacheHaus;
pub use crate::errors::CacheHausError;
pub use crate::manager::DbCacheManager;
pub use crate::policy::{TableCachePolicies, TableCachePolicy};
pub use crate::query_cache::QueryCacheManager;
pub use crate::table_cache::TableCacheManager;

// Re-export centralized config
pub use config::{AppConfig, CacheConfig, TableCacheEntry};

// Re-export commonly used store-object types for convenience
pub use store_object::prelude::*;

// Re-export cache system
pub use cache_system::prelude::*;

// Common external dependencies
pub use anyhow;
pub use async_trait;
pub use tokio;

//! Convenience re-exports for common store-object usage

pub use crate::errors::FilterError;
pub use crate::query_builder::{QueryFilter, QueryOperator};
pub use crate::query_context::QueryContext;
pub use crate::traits::{CacheEntity, CollectionScanner, EntityFilter};

// Common external dependencies
pub use async_trait::async_trait;
pub use serde::{Deserialize, Serialize};
pub use serde_json::{json, Value};

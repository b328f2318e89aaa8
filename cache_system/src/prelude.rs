//! Convenience re-exports for common cache-system usage

// Core cache system components
pub use crate::errors::CacheError;
pub use crate::locks::KeyedLocks;
pub use crate::manager::CacheManager;
pub use crate::media::{CacheMedia, CacheValue, LocalMedia, RemoteMedia};

// Re-export centralized config
pub use config::{CacheMediaType, CacheOptions};

// Common external dependencies
pub use async_trait::async_trait;
pub use redis;
pub use serde::{Deserialize, Serialize};
pub use serde_json;
pub use tokio;

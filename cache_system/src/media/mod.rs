//! Cache media
//!
//! A medium is where cached values physically live. Both media expose the
//! same get/put/exists/delete contract; absent keys are `Ok(None)`, never
//! an error.

pub mod local;
pub mod remote;

use crate::errors::CacheError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub use local::{LocalMedia, MAX_LOCAL_TTL};
pub use remote::RemoteMedia;

/// Anything that can be stored in either medium
pub trait CacheValue: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// Uniform operations over a cache medium
#[async_trait]
pub trait CacheMedia: Send + Sync {
    /// Store `value` under `key` for `ttl`
    async fn put<T: CacheValue>(&self, key: &str, value: &T, ttl: Duration)
    -> Result<(), CacheError>;

    /// Fetch the value under `key` as `T`
    async fn get<T: CacheValue>(&self, key: &str) -> Result<Option<T>, CacheError>;

    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Remaining lifetime of `key`, `None` when absent
    async fn time_to_live(&self, key: &str) -> Result<Option<Duration>, CacheError>;

    /// Store `value` until an absolute point in time. A deadline in the past
    /// removes the key instead.
    async fn put_until<T: CacheValue>(
        &self,
        key: &str,
        value: &T,
        expires_at: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        match (expires_at - Utc::now()).to_std() {
            Ok(ttl) if !ttl.is_zero() => self.put(key, value, ttl).await,
            _ => self.delete(key).await,
        }
    }
}

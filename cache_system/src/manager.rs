//! Cache manager implementation
//!
//! This module provides the CacheManager struct, which owns the single
//! cache medium selected by configuration and exposes typed operations to
//! the cache tiers.

use crate::errors::CacheError;
use crate::media::{CacheMedia, CacheValue, LocalMedia, RemoteMedia};
use chrono::{DateTime, Utc};
use config::{CacheMediaType, CacheOptions};
use std::fmt::Debug;
use std::time::Duration;

enum MediaHandle {
    Local(LocalMedia),
    Remote(RemoteMedia),
}

/// Typed access to the configured cache medium
pub struct CacheManager {
    media: MediaHandle,
}

impl Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("CacheManager");
        match &self.media {
            MediaHandle::Local(media) => debug.field("media", media),
            MediaHandle::Remote(media) => debug.field("media", media),
        };
        debug.finish()
    }
}

impl CacheManager {
    /// Create the medium described by `options`
    pub fn new(options: &CacheOptions) -> Result<Self, CacheError> {
        let media = match options.media_type {
            CacheMediaType::Local => MediaHandle::Local(LocalMedia::new()),
            CacheMediaType::Remote => MediaHandle::Remote(RemoteMedia::new(
                options.media_server_or_default(),
                options.connection_timeout(),
            )?),
        };

        Ok(Self { media })
    }

    /// In-process manager, mostly useful for tests and single-node setups
    pub fn local() -> Self {
        Self {
            media: MediaHandle::Local(LocalMedia::new()),
        }
    }

    pub fn media_type(&self) -> CacheMediaType {
        match self.media {
            MediaHandle::Local(_) => CacheMediaType::Local,
            MediaHandle::Remote(_) => CacheMediaType::Remote,
        }
    }

    /// Store a value with a relative expiry
    pub async fn put<T: CacheValue>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        match &self.media {
            MediaHandle::Local(media) => media.put(key, value, ttl).await,
            MediaHandle::Remote(media) => media.put(key, value, ttl).await,
        }
    }

    /// Store a value with an absolute expiry
    pub async fn put_until<T: CacheValue>(
        &self,
        key: &str,
        value: &T,
        expires_at: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        match &self.media {
            MediaHandle::Local(media) => media.put_until(key, value, expires_at).await,
            MediaHandle::Remote(media) => media.put_until(key, value, expires_at).await,
        }
    }

    /// Fetch a value, falling back to `T::default()` when absent
    pub async fn get<T: CacheValue + Default>(&self, key: &str) -> Result<T, CacheError> {
        Ok(self.try_get(key).await?.unwrap_or_default())
    }

    /// Fetch a value if present
    pub async fn try_get<T: CacheValue>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match &self.media {
            MediaHandle::Local(media) => media.get(key).await,
            MediaHandle::Remote(media) => media.get(key).await,
        }
    }

    pub async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        match &self.media {
            MediaHandle::Local(media) => media.exists(key).await,
            MediaHandle::Remote(media) => media.exists(key).await,
        }
    }

    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        match &self.media {
            MediaHandle::Local(media) => media.delete(key).await,
            MediaHandle::Remote(media) => media.delete(key).await,
        }
    }

    /// Remaining lifetime of `key`
    pub async fn time_to_live(&self, key: &str) -> Result<Option<Duration>, CacheError> {
        match &self.media {
            MediaHandle::Local(media) => media.time_to_live(key).await,
            MediaHandle::Remote(media) => media.time_to_live(key).await,
        }
    }

    /// Check medium connectivity
    pub async fn ping(&self) -> Result<String, CacheError> {
        match &self.media {
            MediaHandle::Local(_) => Ok("PONG".to_string()),
            MediaHandle::Remote(media) => media.ping().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_defaults_when_absent() {
        let manager = CacheManager::local();
        let count: i64 = manager.get("missing").await.unwrap();
        assert_eq!(count, 0);

        let keys: Vec<String> = manager.get("missing").await.unwrap();
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn test_try_get_and_exists() {
        let manager = CacheManager::new(&CacheOptions::new()).unwrap();
        assert_eq!(manager.media_type(), CacheMediaType::Local);

        manager
            .put("flag", &1u8, Duration::from_secs(60))
            .await
            .unwrap();
        assert!(manager.exists("flag").await.unwrap());
        assert_eq!(manager.try_get::<u8>("flag").await.unwrap(), Some(1));

        manager.delete("flag").await.unwrap();
        assert_eq!(manager.try_get::<u8>("flag").await.unwrap(), None);
    }

    #[test]
    fn test_remote_with_bad_address_fails_at_construction() {
        let options = CacheOptions::new().with_remote_media("definitely not a url");
        assert!(matches!(
            CacheManager::new(&options),
            Err(CacheError::MediumUnreachable(_))
        ));
    }

    #[tokio::test]
    async fn test_local_ping() {
        assert_eq!(CacheManager::local().ping().await.unwrap(), "PONG");
    }
}

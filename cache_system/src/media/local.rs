//! In-process cache medium
//!
//! Values are kept by reference (`Arc<dyn Any>`) together with their own
//! deadline. Expired entries read as absent and are dropped lazily.

use super::{CacheMedia, CacheValue};
use crate::errors::CacheError;
use async_trait::async_trait;
use std::any::{Any, type_name};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Longest lifetime an in-process entry can get. Larger TTLs are clamped.
pub const MAX_LOCAL_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

struct LocalEntry {
    value: Arc<dyn Any + Send + Sync>,
    expires_at: Instant,
}

impl LocalEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process medium with native per-entry expiry
#[derive(Default)]
pub struct LocalMedia {
    entries: RwLock<HashMap<String, LocalEntry>>,
}

impl std::fmt::Debug for LocalMedia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entry_count = match self.entries.try_read() {
            Ok(entries) => entries.len().to_string(),
            Err(_) => "locked".to_string(),
        };

        f.debug_struct("LocalMedia")
            .field("entries", &entry_count)
            .finish()
    }
}

impl LocalMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    async fn live_entry(&self, key: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: remove it unless a writer replaced it in the meantime
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
        }
        None
    }
}

#[async_trait]
impl CacheMedia for LocalMedia {
    async fn put<T: CacheValue>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let entry = LocalEntry {
            value: Arc::new(value.clone()),
            expires_at: Instant::now() + ttl.min(MAX_LOCAL_TTL),
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get<T: CacheValue>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let Some(value) = self.live_entry(key).await else {
            return Ok(None);
        };

        match value.downcast_ref::<T>() {
            Some(typed) => Ok(Some(typed.clone())),
            None => Err(CacheError::TypeMismatch {
                key: key.to_string(),
                expected: type_name::<T>(),
            }),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.live_entry(key).await.is_some())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn time_to_live(&self, key: &str) -> Result<Option<Duration>, CacheError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.expires_at - now))
    }
}

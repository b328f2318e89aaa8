//! Redis-backed cache medium
//!
//! Values are stored as JSON text with a millisecond TTL. Reading performs a
//! single full `serde_json` round trip into the requested type.

use super::{CacheMedia, CacheValue};
use crate::errors::CacheError;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use std::fmt::Debug;
use std::time::Duration;
use tokio::sync::RwLock;

/// Remote medium over a Redis server
pub struct RemoteMedia {
    client: Client,
    server: String,
    connect_timeout: Duration,
    connection_pool: RwLock<Option<MultiplexedConnection>>,
}

impl Debug for RemoteMedia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let connection_status = match self.connection_pool.try_read() {
            Ok(pool) => {
                if pool.is_some() {
                    "connected"
                } else {
                    "no_connection"
                }
            }
            Err(_) => "lock_error",
        };

        f.debug_struct("RemoteMedia")
            .field("server", &self.server)
            .field("connected", &connection_status)
            .finish()
    }
}

impl RemoteMedia {
    /// Open a client for `server`. The connection itself is made lazily.
    pub fn new(server: &str, connect_timeout: Duration) -> Result<Self, CacheError> {
        let client = Client::open(server)
            .map_err(|e| CacheError::MediumUnreachable(format!("{}: {}", server, e)))?;

        Ok(Self {
            client,
            server: server.to_string(),
            connect_timeout,
            connection_pool: RwLock::new(None),
        })
    }

    /// Get or create the shared connection
    async fn get_connection(&self) -> Result<MultiplexedConnection, CacheError> {
        if let Some(connection) = self.connection_pool.read().await.as_ref() {
            return Ok(connection.clone());
        }

        let mut pool = self.connection_pool.write().await;
        if let Some(connection) = pool.as_ref() {
            return Ok(connection.clone());
        }

        let connection = tokio::time::timeout(
            self.connect_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| {
            CacheError::MediumUnreachable(format!(
                "{}: connection timed out after {:?}",
                self.server, self.connect_timeout
            ))
        })?
        .map_err(|e| CacheError::MediumUnreachable(format!("{}: {}", self.server, e)))?;

        tracing::debug!("Connected to cache medium at {}", self.server);
        *pool = Some(connection.clone());
        Ok(connection)
    }

    /// Ping Redis to check connectivity
    pub async fn ping(&self) -> Result<String, CacheError> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong)
    }
}

#[async_trait]
impl CacheMedia for RemoteMedia {
    async fn put<T: CacheValue>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let json_str = serde_json::to_string(value)?;
        // PSETEX rejects a zero TTL
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let mut conn = self.get_connection().await?;

        let _: () = conn.pset_ex(key, json_str, ttl_ms).await?;
        Ok(())
    }

    async fn get<T: CacheValue>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let mut conn = self.get_connection().await?;
        let cached_data: Option<String> = conn.get(key).await?;

        match cached_data {
            Some(json_str) if !json_str.is_empty() => Ok(Some(serde_json::from_str(&json_str)?)),
            _ => Ok(None),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.get_connection().await?;
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.get_connection().await?;
        let _: i32 = conn.del(key).await?;
        Ok(())
    }

    async fn time_to_live(&self, key: &str) -> Result<Option<Duration>, CacheError> {
        let mut conn = self.get_connection().await?;
        // -2: no such key, -1: no expiry
        let ttl_ms: i64 = conn.pttl(key).await?;
        Ok(u64::try_from(ttl_ms).ok().map(Duration::from_millis))
    }
}

use super::entity::CacheEntity;
use async_trait::async_trait;

/// Reads a whole collection from the backing store
///
/// Only called when a table cache snapshot is being built, never on the
/// request path.
#[async_trait]
pub trait CollectionScanner: Send + Sync + 'static {
    /// Return every entity currently stored in `T`'s collection
    async fn scan_collection<T: CacheEntity>(&self) -> anyhow::Result<Vec<T>>;
}

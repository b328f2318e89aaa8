//! Cache system for the CacheHaus tiers
//!
//! This crate provides the cache media (in-process and Redis), the
//! CacheManager that owns one of them, the shared key scheme, and
//! per-key locking.

pub mod errors;
pub mod keys;
pub mod locks;
pub mod manager;
pub mod media;
pub mod prelude;

// Re-export centralized config
pub use config::{CacheMediaType, CacheOptions};

pub use errors::CacheError;
pub use locks::KeyedLocks;
pub use manager::CacheManager;
pub use media::{CacheMedia, CacheValue, LocalMedia, MAX_LOCAL_TTL, RemoteMedia};

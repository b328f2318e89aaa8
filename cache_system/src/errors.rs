//! Error types for cache operations
//!
//! This module defines all error types that can occur
//! during cache medium operations and Redis interactions.

use thiserror::Error;

/// Cache system errors
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache medium unreachable: {0}")]
    MediumUnreachable(String),

    #[error("Redis command error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cached value under '{key}' is not a {expected}")]
    TypeMismatch { key: String, expected: &'static str },
}

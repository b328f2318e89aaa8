//! Error types for the CacheHaus crate
//!
//! This module contains all error types that can be returned by CacheHaus operations.

use cache_system::CacheError;
use config::ConfigError;
use store_object::FilterError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheHausError {
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid filter argument: {0}")]
    InvalidArgument(#[from] FilterError),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Cache manager has already been opened for database '{0}'")]
    CacheAlreadyOpened(String),

    #[error("Source query failed: {0}")]
    Source(#[source] anyhow::Error),
}

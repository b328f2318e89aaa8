//! Trait definitions
//!
//! This module contains the contracts the cache tiers consume from the
//! surrounding data layer: entity metadata, full collection scans, and
//! predicates.

pub mod entity;
pub mod filter;
pub mod scanner;

// Re-export all public items for convenience
pub use entity::CacheEntity;
pub use filter::EntityFilter;
pub use scanner::CollectionScanner;

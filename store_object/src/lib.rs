//! Store Object - data layer contracts for CacheHaus
//!
//! This crate provides the types the cache tiers consume from the
//! surrounding data layer: cacheable entities, full collection scans,
//! predicates (closures or interpreted filters), and per-query context.

pub mod errors;
pub mod prelude;
pub mod query_builder;
pub mod query_context;
pub mod traits;

pub use errors::FilterError;
pub use query_builder::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
pub use query_context::QueryContext;
pub use traits::*;

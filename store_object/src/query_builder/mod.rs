//! Query filters
//!
//! This module provides the interpreted filter representation that cache
//! tiers evaluate against in-memory records.

pub mod filter;


pub use filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};

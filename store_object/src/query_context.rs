//! Per-call query description
//!
//! The query executor fills a `QueryContext` for every read. The cache uses
//! it to fingerprint the query and reports back through it whether the
//! result was served from cache.

use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};

/// One executed query as seen by the cache
#[derive(Debug)]
pub struct QueryContext {
    collection_name: String,
    query_text: String,
    parameters: Vec<Value>,
    from_cache: AtomicBool,
}

impl QueryContext {
    pub fn new(collection_name: impl Into<String>, query_text: impl Into<String>) -> Self {
        Self {
            collection_name: collection_name.into(),
            query_text: query_text.into(),
            parameters: Vec::new(),
            from_cache: AtomicBool::new(false),
        }
    }

    /// Append a parameter value, in declaration order
    pub fn with_parameter(mut self, value: impl Into<Value>) -> Self {
        self.parameters.push(value.into());
        self
    }

    pub fn with_parameters(mut self, values: Vec<Value>) -> Self {
        self.parameters.extend(values);
        self
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }

    /// Text identifying this query: the statement alone, or the statement
    /// followed by `_` and the `|`-joined parameter values
    pub fn cache_identity(&self) -> String {
        if self.parameters.is_empty() {
            return self.query_text.clone();
        }

        let joined = self
            .parameters
            .iter()
            .map(parameter_text)
            .collect::<Vec<_>>()
            .join("|");
        format!("{}_{}", self.query_text, joined)
    }

    /// Whether the last read through this context was answered by a cache tier
    pub fn is_from_cache(&self) -> bool {
        self.from_cache.load(Ordering::Acquire)
    }

    pub fn mark_from_cache(&self) {
        self.from_cache.store(true, Ordering::Release);
    }

    pub fn reset_from_cache(&self) {
        self.from_cache.store(false, Ordering::Release);
    }
}

fn parameter_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

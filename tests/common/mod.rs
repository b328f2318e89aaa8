//! Shared fixtures for the integration tests

#![allow(dead_code)]

use cachehaus::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer: String,
    pub status: String,
    pub amount: f64,
}

impl CacheEntity for Order {
    fn collection_name() -> &'static str {
        "orders"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
}

impl CacheEntity for Customer {
    fn collection_name() -> &'static str {
        "customers"
    }
}

pub fn order(id: i64, customer: &str, status: &str, amount: f64) -> Order {
    Order {
        id,
        customer: customer.to_string(),
        status: status.to_string(),
        amount,
    }
}

pub fn sample_orders() -> Vec<Order> {
    vec![
        order(1, "ada", "shipped", 120.0),
        order(2, "grace", "pending", 35.5),
        order(3, "ada", "pending", 12.0),
        order(4, "linus", "shipped", 980.0),
    ]
}

pub fn sample_customers() -> Vec<Customer> {
    vec![
        Customer {
            id: 1,
            name: "ada".to_string(),
        },
        Customer {
            id: 2,
            name: "grace".to_string(),
        },
    ]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScanBehavior {
    Succeed,
    Fail,
    Panic,
}

/// In-memory backing store that counts full scans
pub struct CountingScanner {
    rows: HashMap<&'static str, Vec<Value>>,
    calls: Arc<AtomicUsize>,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    delay: Duration,
    behavior: ScanBehavior,
}

impl CountingScanner {
    pub fn new() -> Self {
        Self {
            rows: HashMap::new(),
            calls: Arc::new(AtomicUsize::new(0)),
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
            behavior: ScanBehavior::Succeed,
        }
    }

    pub fn with_rows<T: CacheEntity>(mut self, rows: &[T]) -> Self {
        let values = rows
            .iter()
            .map(|row| serde_json::to_value(row).unwrap())
            .collect();
        self.rows.insert(T::collection_name(), values);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_behavior(mut self, behavior: ScanBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Shared call counter, still readable after the scanner is moved
    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    /// Highest number of scans observed running at the same time
    pub fn peak_counter(&self) -> Arc<AtomicUsize> {
        self.peak.clone()
    }
}

#[async_trait]
impl CollectionScanner for CountingScanner {
    async fn scan_collection<T: CacheEntity>(&self) -> anyhow::Result<Vec<T>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        match self.behavior {
            ScanBehavior::Succeed => {}
            ScanBehavior::Fail => anyhow::bail!("store offline"),
            ScanBehavior::Panic => panic!("scanner exploded"),
        }

        let rows = self
            .rows
            .get(T::collection_name())
            .cloned()
            .unwrap_or_default();
        Ok(serde_json::from_value(Value::Array(rows))?)
    }
}

pub fn calls(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}

/// Both tiers enabled on a local medium
pub fn both_tiers() -> CacheOptions {
    CacheOptions::new()
        .with_query_cache(true)
        .with_table_cache(true)
}

pub fn order_policies() -> TableCachePolicies {
    TableCachePolicies::new().with::<Order>(None)
}

pub fn orders_ctx(query: &str) -> QueryContext {
    QueryContext::new(Order::collection_name(), query)
}

/// Run one population of `T` to completion
pub async fn populate<T: CacheEntity, S: CollectionScanner>(table_cache: &TableCacheManager<S>) {
    let handle = table_cache
        .start_population::<T>()
        .await
        .unwrap()
        .expect("population should start");
    handle.await.unwrap();
}

/// Wait until `T`'s snapshot shows up, giving up after two seconds
pub async fn wait_for_snapshot<T: CacheEntity, S: CollectionScanner>(
    table_cache: &TableCacheManager<S>,
) -> Vec<T> {
    for _ in 0..200 {
        if let Some(snapshot) = table_cache.snapshot::<T>().await.unwrap() {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("snapshot of {} never appeared", T::collection_name());
}

/// Wait until no population of `T` is in flight
pub async fn wait_for_population<T: CacheEntity, S: CollectionScanner>(
    table_cache: &TableCacheManager<S>,
) {
    for _ in 0..200 {
        if !table_cache.is_populating::<T>().await.unwrap() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("population of {} never finished", T::collection_name());
}

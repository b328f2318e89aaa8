//! Integration tests for the cache orchestrator
//!
//! Read-through ordering (table cache, query cache, source) and
//! write-through invalidation.

mod common;

use cachehaus::prelude::*;
use common::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn manager(options: CacheOptions, scanner: CountingScanner) -> DbCacheManager<CountingScanner> {
    DbCacheManager::new("shop", options, order_policies(), scanner).unwrap()
}

fn query_only() -> CacheOptions {
    CacheOptions::new().with_query_cache(true)
}

/// Fallback query that counts its invocations
fn counting_source(
    counter: &Arc<AtomicUsize>,
    rows: Vec<Order>,
) -> impl FnOnce() -> std::future::Ready<anyhow::Result<Vec<Order>>> {
    let counter = counter.clone();
    move || {
        counter.fetch_add(1, Ordering::SeqCst);
        std::future::ready(Ok(rows))
    }
}

#[tokio::test]
async fn test_identical_reads_hit_source_once() {
    let cache = manager(query_only(), CountingScanner::new());
    let source_calls = Arc::new(AtomicUsize::new(0));
    let filter = |o: &Order| o.customer == "ada";

    let first_ctx = orders_ctx("SELECT * FROM orders WHERE customer = $1").with_parameter("ada");
    let first = cache
        .get_entities(&first_ctx, &filter, counting_source(&source_calls, sample_orders()))
        .await
        .unwrap();
    assert!(!first_ctx.is_from_cache());

    let second_ctx = orders_ctx("SELECT * FROM orders WHERE customer = $1").with_parameter("ada");
    let second = cache
        .get_entities(&second_ctx, &filter, counting_source(&source_calls, Vec::new()))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert!(second_ctx.is_from_cache());
    assert_eq!(source_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_table_cache_answers_before_source() {
    let scanner = CountingScanner::new().with_rows(&sample_orders());
    let scans = scanner.counter();
    let cache = manager(both_tiers(), scanner);
    let source_calls = Arc::new(AtomicUsize::new(0));
    let shipped = QueryFilter::eq("status", json!("shipped"));

    // Cold: the source answers and a population starts in the background
    let ctx = orders_ctx("SELECT * FROM orders WHERE status = 'shipped'");
    cache
        .get_entities(&ctx, &shipped, counting_source(&source_calls, Vec::new()))
        .await
        .unwrap();
    assert_eq!(source_calls.load(Ordering::SeqCst), 1);

    let table_cache = cache.table_cache().unwrap();
    wait_for_snapshot::<Order, _>(table_cache).await;
    wait_for_population::<Order, _>(table_cache).await;

    let ctx = orders_ctx("SELECT * FROM orders WHERE status = 'shipped' -- again");
    let warm = cache
        .get_entities(&ctx, &shipped, counting_source(&source_calls, Vec::new()))
        .await
        .unwrap();
    let ids: Vec<i64> = warm.iter().map(|o| o.id).collect();

    assert_eq!(ids, vec![1, 4]);
    assert!(ctx.is_from_cache());
    assert_eq!(source_calls.load(Ordering::SeqCst), 1);
    assert_eq!(calls(&scans), 1);
}

#[tokio::test]
async fn test_source_results_never_create_a_snapshot() {
    let cache = manager(
        both_tiers(),
        CountingScanner::new().with_behavior(ScanBehavior::Fail),
    );

    let ctx = orders_ctx("SELECT * FROM orders");
    let rows = cache
        .get_entities(&ctx, &|_: &Order| true, || async {
            anyhow::Ok(sample_orders())
        })
        .await
        .unwrap();
    assert_eq!(rows.len(), 4);

    let table_cache = cache.table_cache().unwrap();
    wait_for_population::<Order, _>(table_cache).await;
    assert!(table_cache.snapshot::<Order>().await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_entity_and_get_count() {
    let scanner = CountingScanner::new().with_rows(&sample_orders());
    let cache = manager(both_tiers(), scanner);
    let table_cache = cache.table_cache().unwrap();
    populate::<Order, _>(table_cache).await;

    let pending = QueryFilter::eq("status", json!("pending"));

    let ctx = orders_ctx("SELECT * FROM orders WHERE status = 'pending' LIMIT 1");
    let first = cache
        .get_entity::<Order, _, _, _>(&ctx, &pending, || async { anyhow::Ok(None) })
        .await
        .unwrap();
    assert_eq!(first.map(|o| o.id), Some(2));

    let ctx = orders_ctx("SELECT COUNT(*) FROM orders WHERE status = 'pending'");
    let count = cache
        .get_count::<Order, _, _, _>(&ctx, &pending, || async { anyhow::Ok(0) })
        .await
        .unwrap();
    assert_eq!(count, 2);
    assert!(ctx.is_from_cache());
}

#[tokio::test]
async fn test_missing_entity_is_cached_as_none() {
    let cache = manager(query_only(), CountingScanner::new());
    let source_calls = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
        let ctx = orders_ctx("SELECT * FROM orders WHERE id = $1").with_parameter(404);
        let calls = source_calls.clone();
        let found = cache
            .get_entity(&ctx, &|o: &Order| o.id == 404, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                anyhow::Ok(None)
            })
            .await
            .unwrap();
        assert!(found.is_none());
    }

    assert_eq!(source_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_source_failure_is_reported_and_not_cached() {
    let cache = manager(query_only(), CountingScanner::new());
    let ctx = orders_ctx("SELECT COUNT(*) FROM orders");

    let result = cache
        .get_count::<Order, _, _, _>(&ctx, &|_: &Order| true, || async {
            Err::<u64, _>(anyhow::anyhow!("connection reset"))
        })
        .await;
    assert!(matches!(result, Err(CacheHausError::Source(_))));

    let query_cache = cache.query_cache().unwrap();
    assert_eq!(query_cache.bucket_len("orders").await.unwrap(), 0);
}

/// Cache two status queries for the orders collection
async fn fill(cache: &DbCacheManager<CountingScanner>) {
    for status in ["pending", "shipped"] {
        let ctx = orders_ctx("SELECT * FROM orders WHERE status = $1").with_parameter(status);
        cache
            .get_entities(&ctx, &|_: &Order| true, || async { anyhow::Ok(Vec::new()) })
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_any_write_empties_the_query_bucket() {
    let cache = manager(query_only(), CountingScanner::new());
    let query_cache = cache.query_cache().unwrap();

    fill(&cache).await;
    assert_eq!(query_cache.bucket_len("orders").await.unwrap(), 2);
    // The written entity matches none of the cached queries
    cache
        .add(&order(9, "nobody", "archived", 0.0))
        .await
        .unwrap();
    assert_eq!(query_cache.bucket_len("orders").await.unwrap(), 0);

    fill(&cache).await;
    cache
        .update(&order(9, "nobody", "archived", 1.0), &|o: &Order| o.id == 9)
        .await
        .unwrap();
    assert_eq!(query_cache.bucket_len("orders").await.unwrap(), 0);

    fill(&cache).await;
    cache
        .delete_where::<Order, _>(&QueryFilter::eq("id", json!(9)))
        .await
        .unwrap();
    assert_eq!(query_cache.bucket_len("orders").await.unwrap(), 0);

    fill(&cache).await;
    cache.delete(&order(9, "nobody", "archived", 1.0)).await.unwrap();
    assert_eq!(query_cache.bucket_len("orders").await.unwrap(), 0);

    fill(&cache).await;
    cache.add_many::<Order>(&[]).await.unwrap();
    assert_eq!(query_cache.bucket_len("orders").await.unwrap(), 0);
}

#[tokio::test]
async fn test_writes_patch_the_snapshot() {
    let cache = manager(
        both_tiers(),
        CountingScanner::new().with_rows(&sample_orders()),
    );
    let table_cache = cache.table_cache().unwrap();
    populate::<Order, _>(table_cache).await;

    cache
        .add_many(&[order(5, "margaret", "pending", 5.0)])
        .await
        .unwrap();
    cache
        .update(&order(1, "ada", "returned", 120.0), &|o: &Order| o.id == 1)
        .await
        .unwrap();
    cache.delete(&order(4, "linus", "shipped", 980.0)).await.unwrap();

    let snapshot = table_cache.snapshot::<Order>().await.unwrap().unwrap();
    let summary: Vec<(i64, &str)> = snapshot
        .iter()
        .map(|o| (o.id, o.status.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![(1, "returned"), (2, "pending"), (3, "pending"), (5, "pending")]
    );
}

#[tokio::test]
async fn test_flush_all_clears_both_tiers() {
    let cache = manager(
        both_tiers(),
        CountingScanner::new().with_rows(&sample_orders()),
    );
    let table_cache = cache.table_cache().unwrap();
    let query_cache = cache.query_cache().unwrap();
    populate::<Order, _>(table_cache).await;
    query_cache
        .set_cache_data(&orders_ctx("q"), &1u64)
        .await
        .unwrap();

    cache.flush_all_cache().await.unwrap();

    assert!(table_cache.snapshot::<Order>().await.unwrap().is_none());
    assert_eq!(query_cache.bucket_len("orders").await.unwrap(), 0);
}

#[tokio::test]
async fn test_flush_collection_clears_both_tiers_for_that_collection() {
    let cache = manager(
        both_tiers(),
        CountingScanner::new().with_rows(&sample_orders()),
    );
    let table_cache = cache.table_cache().unwrap();
    let query_cache = cache.query_cache().unwrap();
    populate::<Order, _>(table_cache).await;
    query_cache
        .set_cache_data(&orders_ctx("q"), &1u64)
        .await
        .unwrap();
    query_cache
        .set_cache_data(&QueryContext::new("customers", "q"), &1u64)
        .await
        .unwrap();

    cache.flush_collection_cache("orders").await.unwrap();

    assert!(table_cache.snapshot::<Order>().await.unwrap().is_none());
    assert_eq!(query_cache.bucket_len("orders").await.unwrap(), 0);
    assert_eq!(query_cache.bucket_len("customers").await.unwrap(), 1);
}

#[tokio::test]
async fn test_disabled_tiers_are_not_configured() {
    let cache = manager(CacheOptions::new(), CountingScanner::new());

    assert!(matches!(
        cache.query_cache(),
        Err(CacheHausError::NotConfigured(_))
    ));
    assert!(matches!(
        cache.table_cache(),
        Err(CacheHausError::NotConfigured(_))
    ));

    // With both tiers off every read goes to the source
    let ctx = orders_ctx("SELECT COUNT(*) FROM orders");
    let count = cache
        .get_count::<Order, _, _, _>(&ctx, &|_: &Order| true, || async { anyhow::Ok(7) })
        .await
        .unwrap();
    assert_eq!(count, 7);
    assert!(!ctx.is_from_cache());
}

#[test]
fn test_empty_database_name_is_rejected() {
    let result = DbCacheManager::new("", both_tiers(), order_policies(), CountingScanner::new());
    assert!(matches!(result, Err(CacheHausError::Config(_))));
}

#[test]
fn test_shared_cache_manager() {
    let shared = Arc::new(CacheManager::local());
    let first = DbCacheManager::with_cache_manager(
        "shop",
        both_tiers(),
        order_policies(),
        CountingScanner::new(),
        shared.clone(),
    )
    .unwrap();
    let second = DbCacheManager::with_cache_manager(
        "archive",
        both_tiers(),
        order_policies(),
        CountingScanner::new(),
        shared.clone(),
    )
    .unwrap();

    assert!(Arc::ptr_eq(first.cache_manager(), second.cache_manager()));
    assert_eq!(first.database_name(), "shop");
    assert_eq!(second.options().query_cache_max_count_per_table, 50);
}

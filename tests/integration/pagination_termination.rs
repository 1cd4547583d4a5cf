//! Integration tests for cursor pagination termination

use futures_util::StreamExt;
use serde_json::{json, Value};
use skills_catalog_extractor::extractor::config::MAX_PAGES;
use skills_catalog_extractor::extractor::RateLimiter;
use skills_catalog_extractor::fetcher::{FetchOutcome, FetcherError, RecordFetcher, RecordsPath};
use skills_catalog_extractor::testing::MockTransport;
use std::sync::Arc;
use std::time::Duration;

fn records(prefix: &str, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| json!({ "id": format!("{prefix}-{i:03}") }))
        .collect()
}

fn fetcher(transport: &MockTransport, page_size: usize) -> RecordFetcher {
    RecordFetcher::new(
        Arc::new(transport.clone()),
        Arc::new(RateLimiter::new(Duration::ZERO)),
        page_size,
    )
}

async fn count_records(fetcher: &RecordFetcher, path: &str) -> usize {
    fetcher
        .fetch_all(path, RecordsPath::Root)
        .filter(|outcome| futures_util::future::ready(matches!(outcome, FetchOutcome::Ok(_))))
        .count()
        .await
}

/// A short final page ends pagination without an extra request
#[tokio::test]
async fn test_short_page_terminates() {
    let transport = MockTransport::new().with_pages(
        "/industries",
        vec![records("a", 50), records("b", 50), records("c", 37)],
    );
    let fetcher = fetcher(&transport, 50);

    assert_eq!(count_records(&fetcher, "/industries").await, 137);
    assert_eq!(transport.call_count(), 3);
}

/// Exact multiples of the page size need one trailing empty page
#[tokio::test]
async fn test_empty_page_terminates() {
    let transport = MockTransport::new().with_pages(
        "/industries",
        vec![records("a", 50), records("b", 50), records("c", 50), Vec::new()],
    );
    let fetcher = fetcher(&transport, 50);

    assert_eq!(count_records(&fetcher, "/industries").await, 150);
    assert_eq!(transport.call_count(), 4);
}

/// The id of the last record of a full page is sent as the next cursor
#[tokio::test]
async fn test_cursor_is_last_seen_id() {
    let transport = MockTransport::new()
        .with_json("/industries", None, json!([{"id": "a1"}, {"id": "x123"}]))
        .with_json("/industries", Some("x123"), json!([]));
    let fetcher = fetcher(&transport, 2);

    assert_eq!(count_records(&fetcher, "/industries").await, 2);

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].cursor(), None);
    assert_eq!(calls[1].cursor(), Some("x123"));
    assert!(calls.iter().all(|c| c.param("limit") == Some("2")));
}

/// A full page whose last record lacks an id ends pagination
#[tokio::test]
async fn test_full_page_without_last_id_terminates() {
    let transport = MockTransport::new()
        .with_json("/industries", None, json!([{"id": "a1"}, {"name": "no id"}]));
    let fetcher = fetcher(&transport, 2);

    assert_eq!(count_records(&fetcher, "/industries").await, 2);
    assert_eq!(transport.call_count(), 1);
}

/// A cursor that does not advance ends pagination
#[tokio::test]
async fn test_repeated_cursor_terminates() {
    let transport = MockTransport::new()
        .with_json("/industries", None, json!([{"id": "a"}, {"id": "b"}]))
        .with_json("/industries", Some("b"), json!([{"id": "a"}, {"id": "b"}]));
    let fetcher = fetcher(&transport, 2);

    assert_eq!(count_records(&fetcher, "/industries").await, 4);
    assert_eq!(transport.call_count(), 2);
}

/// A cursor chain longer than the page cap ends with a fatal error
#[tokio::test]
async fn test_page_cap_is_fatal() {
    let pages: Vec<Vec<Value>> = (0..=MAX_PAGES)
        .map(|i| vec![json!({ "id": format!("p{i}") })])
        .collect();
    let transport = MockTransport::new().with_pages("/skills", pages);
    let fetcher = fetcher(&transport, 1);

    let outcomes: Vec<_> = fetcher.fetch_all("/skills", RecordsPath::Root).collect().await;

    assert_eq!(outcomes.len(), MAX_PAGES + 1);
    assert!(outcomes[..MAX_PAGES]
        .iter()
        .all(|outcome| matches!(outcome, FetchOutcome::Ok(_))));
    assert!(matches!(
        outcomes.last(),
        Some(FetchOutcome::Fatal(FetcherError::PageLimitExceeded { pages, .. })) if *pages == MAX_PAGES
    ));
    assert_eq!(transport.call_count(), MAX_PAGES);
}

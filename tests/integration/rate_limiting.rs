//! Integration tests for the shared request rate limiter

use serde_json::json;
use skills_catalog_extractor::config::RunConfig;
use skills_catalog_extractor::extractor::{HierarchyOrchestrator, RateLimiter};
use skills_catalog_extractor::output::MemorySink;
use skills_catalog_extractor::testing::MockTransport;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn config(group: &str, interval_ms: u64) -> RunConfig {
    RunConfig::new("https://api.example.com", "test-key", "US")
        .with_stream_group(group)
        .with_page_size(2)
        .with_rate_limit_interval_ms(interval_ms)
}

/// Three paged requests at a one second interval take at least two seconds
#[tokio::test(start_paused = true)]
async fn test_requests_are_spaced() {
    let transport = MockTransport::new()
        .with_json("/skills", None, json!({"skills": [{"id": "a"}, {"id": "b"}]}))
        .with_json("/skills", Some("b"), json!({"skills": [{"id": "c"}, {"id": "d"}]}))
        .with_json("/skills", Some("d"), json!({"skills": []}));

    let orchestrator =
        HierarchyOrchestrator::new(config("skill_list", 1000), Arc::new(transport.clone()))
            .unwrap();

    let started = Instant::now();
    let summary = orchestrator.run(&mut MemorySink::new()).await.unwrap();

    assert_eq!(summary.requests, 3);
    assert_eq!(transport.call_count(), 3);
    assert!(started.elapsed() >= Duration::from_secs(2));
}

/// Root and child requests share one limiter
#[tokio::test(start_paused = true)]
async fn test_limiter_shared_across_levels() {
    let transport = MockTransport::new()
        .with_json("/industries", None, json!([{"id": "I1"}]))
        .with_json("/industries/I1/skills/emerging", None, json!([]))
        .with_json("/industries/I1/skills/trending", None, json!([]))
        .with_json("/industries/I1/skills/declining", None, json!([]));

    let orchestrator =
        HierarchyOrchestrator::new(config("industry_skills", 500), Arc::new(transport)).unwrap();

    let started = Instant::now();
    let summary = orchestrator.run(&mut MemorySink::new()).await.unwrap();

    assert_eq!(summary.requests, 4);
    assert!(started.elapsed() >= Duration::from_millis(1500));
}

/// Concurrent callers are admitted one interval apart
#[tokio::test(start_paused = true)]
async fn test_concurrent_callers_serialized() {
    let limiter = Arc::new(RateLimiter::new(Duration::from_millis(200)));
    let started = Instant::now();

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                limiter.throttle().await;
                Instant::now()
            })
        })
        .collect();

    let mut admitted = Vec::new();
    for handle in handles {
        admitted.push(handle.await.unwrap());
    }
    admitted.sort();

    for pair in admitted.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_millis(200));
    }
    assert!(started.elapsed() >= Duration::from_millis(800));
}

/// A zero interval never waits
#[tokio::test(start_paused = true)]
async fn test_zero_interval_does_not_wait() {
    let limiter = RateLimiter::new(Duration::ZERO);
    let started = Instant::now();
    for _ in 0..10 {
        limiter.throttle().await;
    }
    assert!(started.elapsed() < Duration::from_millis(1));
}

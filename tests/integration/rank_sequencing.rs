//! Integration tests for per-(parent, category) rank sequencing

use serde_json::json;
use skills_catalog_extractor::config::RunConfig;
use skills_catalog_extractor::extractor::{HierarchyOrchestrator, RankCounters};
use skills_catalog_extractor::output::MemorySink;
use skills_catalog_extractor::testing::MockTransport;
use skills_catalog_extractor::{SkillCategory, StreamKind};
use std::sync::Arc;

fn scripted() -> MockTransport {
    MockTransport::new()
        .with_json("/industries", None, json!([{"id": "I1"}, {"id": "I2"}]))
        .with_pages(
            "/industries/I1/skills/emerging",
            vec![vec![json!({"id": "a"}), json!({"id": "b"})], vec![json!({"id": "c"})]],
        )
        .with_json("/industries/I1/skills/trending", None, json!([{"id": "d"}]))
        .with_json("/industries/I2/skills/emerging", None, json!([{"id": "e"}, {"id": "f"}]))
        .with_json("/industries/I2/skills/emerging", Some("f"), json!([]))
        .with_json("/industries/I2/skills/trending", None, json!([{"id": "g"}]))
}

fn orchestrator(transport: MockTransport) -> HierarchyOrchestrator {
    let config = RunConfig::new("https://api.example.com", "test-key", "US")
        .with_stream_group("industry_skills")
        .with_page_size(2)
        .with_rate_limit_interval_ms(0);
    HierarchyOrchestrator::new(config, Arc::new(transport)).unwrap()
}

fn ranks(sink: &MemorySink) -> Vec<(String, SkillCategory, String, u32)> {
    sink.skills()
        .into_iter()
        .map(|s| (s.parent_id.clone(), s.category, s.id.clone(), s.rank))
        .collect()
}

/// Ranks count from 1 within each (parent, category) partition, across pages
#[tokio::test]
async fn test_ranks_are_partitioned() {
    let mut sink = MemorySink::new();
    orchestrator(scripted()).run(&mut sink).await.unwrap();

    let expected = vec![
        ("I1".to_string(), SkillCategory::Emerging, "a".to_string(), 1),
        ("I1".to_string(), SkillCategory::Emerging, "b".to_string(), 2),
        ("I1".to_string(), SkillCategory::Emerging, "c".to_string(), 3),
        ("I1".to_string(), SkillCategory::Trending, "d".to_string(), 1),
        ("I2".to_string(), SkillCategory::Emerging, "e".to_string(), 1),
        ("I2".to_string(), SkillCategory::Emerging, "f".to_string(), 2),
        ("I2".to_string(), SkillCategory::Trending, "g".to_string(), 1),
    ];
    assert_eq!(ranks(&sink), expected);
}

/// Categories are fetched in the configured order, one after the other
#[tokio::test]
async fn test_categories_fetched_in_order() {
    let transport = scripted();
    let mut sink = MemorySink::new();
    orchestrator(transport.clone()).run(&mut sink).await.unwrap();

    let paths: Vec<_> = transport
        .calls()
        .into_iter()
        .map(|c| c.path)
        .filter(|p| p.starts_with("/industries/I1/"))
        .collect();
    assert_eq!(
        paths,
        vec![
            "/industries/I1/skills/emerging",
            "/industries/I1/skills/emerging",
            "/industries/I1/skills/trending",
            "/industries/I1/skills/declining",
        ]
    );
}

/// A second run starts its ranks over
#[tokio::test]
async fn test_ranks_reset_between_runs() {
    let orchestrator = orchestrator(scripted());

    let mut first = MemorySink::new();
    orchestrator.run(&mut first).await.unwrap();
    let mut second = MemorySink::new();
    orchestrator.run(&mut second).await.unwrap();

    assert_eq!(ranks(&first), ranks(&second));
}

/// The counter table itself is monotonic per partition
#[test]
fn test_rank_counters_monotonic() {
    let counters = RankCounters::new();
    assert_eq!(counters.next_rank("I1", SkillCategory::Emerging), 1);
    assert_eq!(counters.next_rank("I1", SkillCategory::Emerging), 2);
    assert_eq!(counters.next_rank("I1", SkillCategory::Declining), 1);
    assert_eq!(counters.next_rank("I2", SkillCategory::Emerging), 1);
    assert_eq!(counters.current("I1", SkillCategory::Emerging), 2);
    assert_eq!(counters.current("I3", SkillCategory::Trending), 0);
    assert_eq!(counters.partitions(), 3);
}

/// Industries and occupations sharing parent ids keep separate rank sequences
#[tokio::test]
async fn test_overlapping_parent_ids_across_hierarchies() {
    let transport = MockTransport::new()
        .with_json("/industries", None, json!([{"id": "7"}, {"id": "8"}]))
        .with_json("/industries", Some("8"), json!([]))
        .with_json("/industries/7/skills/emerging", None, json!([{"id": "a"}, {"id": "b"}]))
        .with_json("/industries/7/skills/emerging", Some("b"), json!([]))
        .with_json("/industries/8/skills/trending", None, json!([{"id": "c"}]))
        .with_json("/occupations", None, json!([{"id": 7}, {"id": "8"}]))
        .with_json("/occupations", Some("8"), json!([]))
        .with_json("/occupations/7/skills/emerging", None, json!([{"id": "d"}]))
        .with_json("/occupations/8/skills/trending", None, json!([{"id": "e"}, {"id": "f"}]))
        .with_json("/occupations/8/skills/trending", Some("f"), json!([]));

    let config = RunConfig::new("https://api.example.com", "test-key", "US")
        .with_stream_group("industry_skills,occupation_skills")
        .with_page_size(2)
        .with_rate_limit_interval_ms(0);
    let orchestrator = HierarchyOrchestrator::new(config, Arc::new(transport)).unwrap();
    let mut sink = MemorySink::new();
    let summary = orchestrator.run(&mut sink).await.unwrap();

    assert!(summary.is_success());
    assert_eq!(summary.records_for(StreamKind::IndustrySkills), 3);
    assert_eq!(summary.records_for(StreamKind::OccupationSkills), 3);

    let expected = vec![
        ("7".to_string(), SkillCategory::Emerging, "a".to_string(), 1),
        ("7".to_string(), SkillCategory::Emerging, "b".to_string(), 2),
        ("8".to_string(), SkillCategory::Trending, "c".to_string(), 1),
        ("7".to_string(), SkillCategory::Emerging, "d".to_string(), 1),
        ("8".to_string(), SkillCategory::Trending, "e".to_string(), 1),
        ("8".to_string(), SkillCategory::Trending, "f".to_string(), 2),
    ];
    assert_eq!(ranks(&sink), expected);
}

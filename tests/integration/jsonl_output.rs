//! Integration tests for the line-delimited JSON output

use serde_json::{json, Value};
use skills_catalog_extractor::config::RunConfig;
use skills_catalog_extractor::extractor::HierarchyOrchestrator;
use skills_catalog_extractor::output::JsonLinesSink;
use skills_catalog_extractor::testing::MockTransport;
use std::sync::Arc;

fn transport() -> MockTransport {
    MockTransport::new()
        .with_json("/industries", None, json!([{"id": "I1", "name": "Tech"}, {"id": "I2"}]))
        .with_json("/industries/I1/skills/emerging", None, json!([{"id": "s1", "name": "Rust"}]))
        .with_json("/industries/I2/skills/emerging", None, json!([{"id": "s2"}]))
}

fn config() -> RunConfig {
    RunConfig::new("https://api.example.com", "test-key", "DE")
        .with_stream_group("industry_skills")
        .with_skills_category("emerging")
        .with_rate_limit_interval_ms(0)
}

fn parse_lines(bytes: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

/// Each stream is announced once, before its first record
#[tokio::test]
async fn test_schema_precedes_records() {
    let orchestrator = HierarchyOrchestrator::new(config(), Arc::new(transport())).unwrap();
    let mut sink = JsonLinesSink::new(Vec::new());
    orchestrator.run(&mut sink).await.unwrap();
    assert_eq!(sink.records_written(), 4);

    let messages = parse_lines(&sink.into_inner().unwrap());
    let kinds: Vec<_> = messages
        .iter()
        .map(|m| format!("{}:{}", m["type"].as_str().unwrap(), m["stream"].as_str().unwrap()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            "SCHEMA:industries",
            "RECORD:industries",
            "SCHEMA:industry_skills",
            "RECORD:industry_skills",
            "RECORD:industries",
            "RECORD:industry_skills",
        ]
    );

    assert_eq!(messages[0]["key_properties"], json!(["id"]));
    assert!(messages[0]["schema"]["properties"].is_object());
}

/// Records carry the enrichment fields and an extraction timestamp
#[tokio::test]
async fn test_record_messages_are_enriched() {
    let orchestrator = HierarchyOrchestrator::new(config(), Arc::new(transport())).unwrap();
    let mut sink = JsonLinesSink::new(Vec::new());
    orchestrator.run(&mut sink).await.unwrap();

    let messages = parse_lines(&sink.into_inner().unwrap());
    let skill = &messages[3];
    assert_eq!(skill["record"]["id"], "s1");
    assert_eq!(skill["record"]["rank"], 1);
    assert_eq!(skill["record"]["category"], "emerging");
    assert_eq!(skill["record"]["parent_id"], "I1");
    assert_eq!(skill["record"]["country_code"], "DE");

    let extracted = skill["time_extracted"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(extracted).is_ok());

    assert_eq!(messages[1]["record"]["country_code"], "DE");
}

/// A file sink creates missing parent directories
#[tokio::test]
async fn test_file_sink_creates_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("out.jsonl");

    let orchestrator = HierarchyOrchestrator::new(config(), Arc::new(transport())).unwrap();
    let mut sink = JsonLinesSink::create(&path).unwrap();
    orchestrator.run(&mut sink).await.unwrap();
    drop(sink.into_inner().unwrap());

    let contents = std::fs::read(&path).unwrap();
    assert_eq!(parse_lines(&contents).len(), 6);
}

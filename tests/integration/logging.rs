//! Integration tests for the binary's log output

use assert_cmd::Command;
use serde_json::Value;
use std::io::Write;
use tempfile::NamedTempFile;

const BIN: &str = "skills-catalog-extractor";

const PROXY_VARS: [&str; 6] = [
    "HTTP_PROXY",
    "HTTPS_PROXY",
    "ALL_PROXY",
    "http_proxy",
    "https_proxy",
    "all_proxy",
];

fn command() -> Command {
    let mut cmd = Command::cargo_bin(BIN).unwrap();
    cmd.env_remove("CATALOG_EXTRACTOR_CONFIG")
        .env_remove("LOG_FORMAT")
        .env_remove("RUST_LOG");
    for var in PROXY_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

/// Points at a closed local port so the first request fails without retries
fn unreachable_config() -> NamedTempFile {
    config_file(
        r#"{
            "api_base_url": "http://127.0.0.1:1",
            "api_key": "log-secret",
            "country_code": "US",
            "stream_group": "skill_list",
            "rate_limit_interval_ms": 0,
            "max_retries": 0
        }"#,
    )
}

fn run_extract(config: &NamedTempFile, envs: &[(&str, &str)]) -> (bool, String) {
    let mut cmd = command();
    cmd.arg("extract").arg("--config").arg(config.path());
    for (key, value) in envs {
        cmd.env(key, value);
    }
    let output = cmd.output().unwrap();
    (
        output.status.success(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    )
}

fn json_lines(stderr: &str) -> Vec<Value> {
    stderr
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).unwrap_or_else(|e| panic!("not JSON ({e}): {line}"))
        })
        .collect()
}

fn message(line: &Value) -> &str {
    line["fields"]["message"].as_str().unwrap_or_default()
}

/// The default filter shows info events and the final error
#[test]
fn test_default_filter_logs_info_to_stderr() {
    let config = unreachable_config();
    let (success, stderr) = run_extract(&config, &[]);

    assert!(!success);
    assert!(stderr.contains("Loaded run configuration"));
    assert!(stderr.contains("Network error"));
    assert!(stderr.contains("Command failed"));
    assert!(!stderr.contains("log-secret"));
}

/// LOG_FORMAT=json turns every stderr line into a JSON event
#[test]
fn test_json_format_emits_structured_events() {
    let config = unreachable_config();
    let (success, stderr) = run_extract(&config, &[("LOG_FORMAT", "json")]);
    assert!(!success);

    let lines = json_lines(&stderr);
    let loaded = lines
        .iter()
        .find(|line| message(line) == "Loaded run configuration")
        .expect("config event");
    assert_eq!(loaded["level"], "INFO");
    assert!(loaded["fields"]["config"]
        .as_str()
        .is_some_and(|config| config.contains("<redacted>")));

    let failed = lines
        .iter()
        .find(|line| message(line).starts_with("Command failed"))
        .expect("failure event");
    assert_eq!(failed["level"], "ERROR");
}

/// RUST_LOG overrides the default filter
#[test]
fn test_rust_log_overrides_default_filter() {
    let config = unreachable_config();
    let (_, stderr) = run_extract(&config, &[("RUST_LOG", "skills_catalog_extractor=warn")]);
    assert!(!stderr.contains("Loaded run configuration"));
    assert!(stderr.contains("Network error"));
    assert!(stderr.contains("Command failed"));

    let (_, stderr) = run_extract(&config, &[("RUST_LOG", "off")]);
    assert!(!stderr.contains("Command failed"));
    assert!(!stderr.contains("Network error"));
}

/// A rejected configuration is reported as a JSON error event
#[test]
fn test_invalid_config_logged_as_json_error() {
    let config = config_file(r#"{"api_base_url": "https://api.example.com", "api_key": "k"}"#);
    let output = command()
        .env("LOG_FORMAT", "json")
        .args(["validate", "--config"])
        .arg(config.path())
        .output()
        .unwrap();
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    let failed = stderr
        .lines()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .find(|line| message(line).starts_with("Command failed"))
        .expect("failure event");
    assert_eq!(failed["level"], "ERROR");
    assert!(message(&failed).contains("country_code"));
}

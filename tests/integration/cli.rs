//! Integration tests for the command-line binary

use assert_cmd::Command;
use std::io::Write;
use tempfile::NamedTempFile;

const BIN: &str = "skills-catalog-extractor";

fn command() -> Command {
    let mut cmd = Command::cargo_bin(BIN).unwrap();
    cmd.env_remove("CATALOG_EXTRACTOR_CONFIG").env_remove("LOG_FORMAT");
    cmd
}

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

/// Help lists every subcommand
#[test]
fn test_help() {
    let output = command().arg("--help").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for subcommand in ["extract", "discover", "validate"] {
        assert!(stdout.contains(subcommand), "missing {subcommand} in help");
    }
}

/// Extract refuses to start without a configuration
#[test]
fn test_extract_requires_config() {
    command().arg("extract").assert().failure();
}

/// Validate accepts a complete configuration and never prints the key
#[test]
fn test_validate_valid_config() {
    let file = config_file(
        r#"{"api_base_url": "https://api.example.com", "api_key": "super-secret", "country_code": "US"}"#,
    );

    let output = command()
        .args(["validate", "--config"])
        .arg(file.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("Valid configuration"));
    assert!(stdout.contains("US"));
    assert!(!stdout.contains("super-secret"));
    assert!(!stderr.contains("super-secret"));
}

/// Validate fails when a required key is missing
#[test]
fn test_validate_missing_country_code() {
    let file = config_file(r#"{"api_base_url": "https://api.example.com", "api_key": "k"}"#);

    command()
        .args(["validate", "--config"])
        .arg(file.path())
        .assert()
        .failure();
}

/// A flag override can complete a config file
#[test]
fn test_validate_with_country_override() {
    let file = config_file(r#"{"api_base_url": "https://api.example.com", "api_key": "k"}"#);

    let output = command()
        .args(["validate", "--country-code", "GB", "--config"])
        .arg(file.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("GB"));
}

/// Discover works without a configuration file
#[test]
fn test_discover_without_config() {
    let output = command().arg("discover").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let catalog: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    let streams: Vec<_> = catalog["streams"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["stream"].as_str().unwrap().to_string())
        .collect();
    assert!(streams.contains(&"industry_skills".to_string()));
    assert_eq!(streams.len(), 6);
}

/// An unknown stream group is rejected
#[test]
fn test_discover_unknown_group() {
    command()
        .args(["discover", "--stream-group", "bogus"])
        .assert()
        .failure();
}

/// A zero page size is rejected at parse time
#[test]
fn test_zero_page_size_rejected() {
    command()
        .args(["discover", "--page-size", "0"])
        .assert()
        .failure();
}

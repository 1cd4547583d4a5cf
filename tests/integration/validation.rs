//! Integration tests for the validate command

use clap::Parser;
use skills_catalog_extractor::cli::{Cli, CliError, Commands};
use skills_catalog_extractor::config::ConfigError;
use std::io::Write;

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

async fn validate(args: &[&str]) -> Result<(), CliError> {
    let cli = Cli::parse_from(
        std::iter::once("skills-catalog-extractor")
            .chain(std::iter::once("validate"))
            .chain(args.iter().copied()),
    );
    match &cli.command {
        Commands::Validate(cmd) => cmd.execute(&cli).await,
        other => panic!("unexpected command: {other:?}"),
    }
}

/// A complete configuration validates
#[tokio::test]
async fn test_validate_complete_config() {
    let file = config_file(
        r#"{"api_base_url": "https://api.example.com", "api_key": "k", "country_code": "US",
            "stream_group": ["industry_skills", "skill_list"], "skills_category": "trending"}"#,
    );
    let path = file.path().to_str().unwrap();

    assert!(validate(&["--config", path]).await.is_ok());
}

/// Unknown categories are rejected
#[tokio::test]
async fn test_validate_unknown_category() {
    let file = config_file(
        r#"{"api_base_url": "https://api.example.com", "api_key": "k", "country_code": "US"}"#,
    );
    let path = file.path().to_str().unwrap();

    let result = validate(&["--config", path, "--skills-category", "stagnant"]).await;
    assert!(matches!(result, Err(CliError::ConfigError(_))));
}

/// Missing required keys are reported by name
#[tokio::test]
async fn test_validate_missing_api_key() {
    let file = config_file(r#"{"api_base_url": "https://api.example.com", "country_code": "US"}"#);
    let path = file.path().to_str().unwrap();

    let result = validate(&["--config", path]).await;
    match result {
        Err(CliError::ConfigError(ConfigError::MissingField(key))) => assert_eq!(key, "api_key"),
        other => panic!("unexpected result: {other:?}"),
    }
}

/// Malformed JSON is a config error
#[tokio::test]
async fn test_validate_malformed_file() {
    let file = config_file("{ not json");
    let path = file.path().to_str().unwrap();

    let result = validate(&["--config", path]).await;
    assert!(matches!(result, Err(CliError::ConfigError(_))));
}

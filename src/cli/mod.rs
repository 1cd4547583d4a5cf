//! CLI command implementations

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::RunConfig;

pub mod discover;
pub mod error;
pub mod extract;
pub mod validate;

pub use discover::DiscoverCommand;
pub use error::CliError;
pub use extract::ExtractCommand;
pub use validate::ValidateCommand;

/// Parse and validate a page size
fn parse_page_size(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("page size must be at least 1".to_string());
    }
    Ok(value)
}

/// Skills Catalog Extractor CLI
#[derive(Parser, Debug)]
#[command(name = "skills-catalog-extractor")]
#[command(
    about = "Extract industry, occupation and skill catalog data from a paginated REST API",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// JSON run configuration file
    #[arg(long, short, global = true, env = "CATALOG_EXTRACTOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the configured country code
    #[arg(long, global = true)]
    pub country_code: Option<String>,

    /// Override the stream groups (industry_skills, occupation_skills, skill_list, all; comma-separated)
    #[arg(long, global = true)]
    pub stream_group: Option<String>,

    /// Pin fan-out to a single skills category (emerging, trending, declining)
    #[arg(long, global = true)]
    pub skills_category: Option<String>,

    /// Override the page size limit (default: 50)
    #[arg(long, global = true, value_parser = parse_page_size)]
    pub page_size: Option<usize>,
}

impl Cli {
    /// Load the config file named by `--config` and apply flag overrides
    pub fn load_config(&self) -> Result<RunConfig, CliError> {
        let path = self.config.as_ref().ok_or_else(|| {
            CliError::InvalidArgument("--config <path> is required for this command".to_string())
        })?;
        let config = RunConfig::load(path)?;
        Ok(self.apply_overrides(config))
    }

    /// Apply flag overrides on top of file values
    pub fn apply_overrides(&self, mut config: RunConfig) -> RunConfig {
        if let Some(country_code) = &self.country_code {
            config.country_code = Some(country_code.clone());
        }
        if let Some(group) = &self.stream_group {
            config.stream_group = Some(vec![group.clone()]);
        }
        if let Some(category) = &self.skills_category {
            config.skills_category = Some(category.clone());
        }
        if let Some(page_size) = self.page_size {
            config.page_size = Some(page_size);
        }
        config
    }
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the extraction and write records as line-delimited JSON
    Extract(ExtractCommand),

    /// Print the stream catalog with key properties and JSON schemas
    Discover(DiscoverCommand),

    /// Validate a run configuration without issuing requests
    Validate(ValidateCommand),
}

//! Validation subcommand

use clap::Parser;

use super::{Cli, CliError};

/// Validate command for checking a run configuration
#[derive(Parser, Debug)]
pub struct ValidateCommand {}

impl ValidateCommand {
    /// Load, override and validate the configuration; no request is issued
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let config = cli.load_config()?;

        if let Err(e) = config.validate() {
            eprintln!("Invalid configuration: {}", e);
            return Err(e.into());
        }

        let selection = config.stream_selection()?;
        let categories = config.categories()?;

        println!("Valid configuration");
        println!("  API base URL: {}", config.api_base_url()?);
        println!("  Country code: {}", config.country_code()?);
        println!("  Page size: {}", config.page_size());
        println!(
            "  Stream groups: {}",
            selection
                .groups()
                .iter()
                .map(|g| g.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!(
            "  Categories: {}",
            categories
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!("  Rate limit interval: {:?}", config.rate_limit_interval());
        Ok(())
    }
}

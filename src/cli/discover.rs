//! Discover command: print the stream catalog

use clap::Parser;
use serde_json::json;

use super::{Cli, CliError};
use crate::catalog;
use crate::config::{RunConfig, StreamSelection};

/// Discover command arguments
#[derive(Parser, Debug)]
pub struct DiscoverCommand {
    /// Pretty-print the catalog
    #[arg(long, default_value_t = false)]
    pub pretty: bool,
}

impl DiscoverCommand {
    /// Print every selected stream with its key properties and JSON schema.
    ///
    /// A config file is optional; without one every stream is listed unless
    /// `--stream-group` narrows it.
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let config = match &cli.config {
            Some(_) => cli.load_config()?,
            None => cli.apply_overrides(RunConfig::default()),
        };
        let selection = config.stream_selection()?;

        println!("{}", self.render(&selection)?);
        Ok(())
    }

    fn render(&self, selection: &StreamSelection) -> Result<String, CliError> {
        let document = json!({ "streams": catalog::catalog(selection) });
        let rendered = if self.pretty {
            serde_json::to_string_pretty(&document)
        } else {
            serde_json::to_string(&document)
        };
        rendered.map_err(|e| {
            CliError::OutputError(crate::output::OutputError::SerializationError(e.to_string()))
        })
    }
}

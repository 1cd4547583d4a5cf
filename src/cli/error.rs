//! CLI error types and conversions

use crate::config::ConfigError;
use crate::extractor::ExtractError;
use crate::output::OutputError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// Extraction error
    #[error("extraction error: {0}")]
    ExtractError(#[from] ExtractError),

    /// Output error
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Metrics exporter could not be started
    #[error("metrics error: {0}")]
    MetricsError(String),

    /// Run completed but some hierarchies were aborted
    #[error("{count} hierarchy(ies) aborted by schema errors")]
    HierarchyFailures {
        /// Number of aborted hierarchies
        count: usize,
    },
}

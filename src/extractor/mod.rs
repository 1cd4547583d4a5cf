//! Hierarchical extraction engine
//!
//! This module walks the catalog hierarchy and turns raw API records into
//! enriched, ranked, typed records.
//!
//! # Overview
//!
//! 1. **Root Fetch**: every root record of a hierarchy is fetched page by page
//! 2. **Context Derivation**: [`context::ContextPropagator`] extracts the parent id
//!    and stamps the run's country code
//! 3. **Fan-out**: [`sequencer::CategorySequencer`] fetches each skill category in
//!    order and assigns per-(parent, category) ranks
//! 4. **Orchestration**: [`orchestrator::HierarchyOrchestrator`] drives the
//!    selected stream groups and writes every record to a
//!    [`crate::output::RecordSink`]
//!
//! All requests of a run pass through one shared [`rate_limit::RateLimiter`].
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use skills_catalog_extractor::config::RunConfig;
//! use skills_catalog_extractor::extractor::HierarchyOrchestrator;
//! use skills_catalog_extractor::output::memory::MemorySink;
//! use skills_catalog_extractor::testing::MockTransport;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = MockTransport::new()
//!     .with_json("/industries", None, json!([{"id": "I1", "name": "Tech"}]));
//! let config = RunConfig::new("https://api.example.com", "key", "US")
//!     .with_stream_group("industry_skills");
//!
//! let orchestrator = HierarchyOrchestrator::new(config, Arc::new(transport))?;
//! let mut sink = MemorySink::new();
//! let summary = orchestrator.run(&mut sink).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! - 403/404 on a sub-resource: skipped, siblings continue
//! - Parent without an id: aborts that hierarchy, recorded in the run summary
//! - Other transport failures and cancellation: abort the run

pub mod config;
pub mod context;
pub mod orchestrator;
pub mod rate_limit;
pub mod sequencer;

pub use context::{ChildContext, ContextPropagator, PathTemplate};
pub use orchestrator::{HierarchyFailure, HierarchyOrchestrator, RunState, RunSummary};
pub use rate_limit::RateLimiter;
pub use sequencer::{CategorySequencer, FanOutItem, RankCounters};

use crate::config::ConfigError;
use crate::fetcher::FetcherError;
use crate::output::OutputError;

/// Extraction errors
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Invalid or incomplete run configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Fatal fetch failure
    #[error("fetch error: {0}")]
    Fetcher(#[from] FetcherError),

    /// Sink failure
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// Parent record without a resolvable identifier
    #[error("{entity} record is missing its identifier field '{field}'")]
    MissingIdentifier {
        /// Parent entity kind
        entity: &'static str,
        /// Identifier field that was looked up
        field: &'static str,
    },

    /// Record that cannot be parsed or fails validation
    #[error("invalid {stream} record: {message}")]
    Schema {
        /// Stream the record belongs to
        stream: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// Path template placeholder without a value
    #[error("path template error: {0}")]
    Template(String),

    /// Shutdown was requested
    #[error("extraction cancelled")]
    Cancelled,
}

impl ExtractError {
    /// Whether the error indicates an upstream schema violation.
    ///
    /// Schema errors abort their hierarchy only.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            ExtractError::MissingIdentifier { .. } | ExtractError::Schema { .. }
        )
    }
}

/// Result type for extraction operations
pub type ExtractResult<T> = Result<T, ExtractError>;

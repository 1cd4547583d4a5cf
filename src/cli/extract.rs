//! Extract command implementation

use clap::Parser;
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use super::{Cli, CliError};
use crate::extractor::{HierarchyOrchestrator, RunSummary};
use crate::fetcher::http::HttpTransport;
use crate::output::{JsonLinesSink, OutputError};
use crate::shutdown::SharedShutdown;

/// Extract command arguments
#[derive(Parser, Debug)]
pub struct ExtractCommand {
    /// Write records to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9000)
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

impl ExtractCommand {
    /// Execute the extraction
    pub async fn execute(
        &self,
        cli: &Cli,
        shutdown: SharedShutdown,
    ) -> Result<RunSummary, CliError> {
        let config = cli.load_config()?;
        config.validate()?;
        info!(config = ?config, "Loaded run configuration");

        if let Some(addr) = self.metrics_addr {
            crate::metrics::init_metrics(addr)
                .map_err(|e| CliError::MetricsError(e.to_string()))?;
        }

        let transport = HttpTransport::from_config(&config)?.with_shutdown(shutdown.clone());
        let orchestrator =
            HierarchyOrchestrator::new(config, Arc::new(transport))?.with_shutdown(shutdown);

        let summary = match &self.output {
            Some(path) => {
                let mut sink = JsonLinesSink::create(path)?;
                let summary = orchestrator.run(&mut sink).await?;
                sink.into_inner()?
                    .sync_all()
                    .map_err(|e| OutputError::IoError(format!("Failed to sync output: {e}")))?;
                summary
            }
            None => {
                let mut sink = JsonLinesSink::stdout();
                let summary = orchestrator.run(&mut sink).await?;
                sink.into_inner()?
                    .flush()
                    .map_err(|e| OutputError::FlushError(format!("Failed to flush stdout: {e}")))?;
                summary
            }
        };

        for (stream, count) in &summary.records {
            info!(stream = %stream, records = count, "Stream summary");
        }
        info!(
            records = summary.total_records(),
            skipped = summary.skipped,
            requests = summary.requests,
            "Run summary"
        );

        if !summary.is_success() {
            for failure in &summary.failures {
                warn!(group = failure.group.name(), error = %failure.error, "Hierarchy failed");
            }
            return Err(CliError::HierarchyFailures {
                count: summary.failures.len(),
            });
        }

        Ok(summary)
    }
}

//! Extraction metrics
//!
//! Counters and histograms are recorded through the `metrics` facade. Without
//! an installed recorder they are no-ops, so library users and tests pay
//! nothing. The CLI installs a Prometheus exporter when `--metrics-addr` is set.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{debug, info};

use crate::fetcher::SkipReason;
use crate::StreamKind;

static METRICS_INITIALIZED: OnceCell<SocketAddr> = OnceCell::new();

/// Install the Prometheus exporter and register metric descriptions.
///
/// Idempotent: later calls are ignored.
pub fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(existing) = METRICS_INITIALIZED.get() {
        debug!(%existing, "Metrics already initialized, skipping");
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "catalog_http_requests_total",
        Unit::Count,
        "Requests issued to the catalog API, by status"
    );
    describe_histogram!(
        "catalog_request_duration_seconds",
        Unit::Seconds,
        "Catalog API request duration"
    );
    describe_counter!(
        "catalog_records_emitted_total",
        Unit::Count,
        "Records handed to the sink, by stream"
    );
    describe_counter!(
        "catalog_resources_skipped_total",
        Unit::Count,
        "Sub-resources skipped after 403/404, by reason"
    );

    let _ = METRICS_INITIALIZED.set(addr);
    info!(%addr, "Metrics exporter listening");
    Ok(())
}

/// Record a completed request
pub fn record_request(status: u16, duration: Duration) {
    counter!("catalog_http_requests_total", "status" => status.to_string()).increment(1);
    histogram!("catalog_request_duration_seconds").record(duration.as_secs_f64());
}

/// Record a record emitted on a stream
pub fn record_emitted(stream: StreamKind) {
    counter!("catalog_records_emitted_total", "stream" => stream.name()).increment(1);
}

/// Record a skipped sub-resource
pub fn record_skip(reason: &SkipReason) {
    counter!("catalog_resources_skipped_total", "reason" => reason.label()).increment(1);
}

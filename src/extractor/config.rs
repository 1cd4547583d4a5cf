//! Extraction configuration constants

use std::time::Duration;

/// Default page size limit sent as `limit`.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Default minimum spacing between two requests, in milliseconds.
/// The upstream budget is shared by the whole integration, so one request per
/// second is the documented safe rate.
pub const DEFAULT_RATE_LIMIT_INTERVAL_MS: u64 = 1000;

/// Default per-request timeout in seconds.
/// Detail endpoints on large occupations can take minutes to render.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Maximum number of transport retries for 429/5xx/network failures.
pub const MAX_RETRIES: u32 = 5;

/// Initial backoff delay in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 1000; // 1 second

/// Maximum backoff delay in milliseconds.
/// (retry 5 = 32s capped to 30s)
pub const MAX_BACKOFF_MS: u64 = 30000; // 30 seconds

/// Maximum number of pages fetched for a single resource.
/// A cursor that keeps producing full pages past this point is treated as a
/// loop and aborts the run.
pub const MAX_PAGES: usize = 10_000;

/// Flush interval for record sinks (flush every N records)
pub const FLUSH_INTERVAL: usize = 1_000;

/// Calculate exponential backoff delay
pub fn calculate_backoff(retry_count: u32) -> Duration {
    let delay_ms = INITIAL_BACKOFF_MS.saturating_mul(2u64.saturating_pow(retry_count));
    let delay_ms = delay_ms.min(MAX_BACKOFF_MS);
    Duration::from_millis(delay_ms)
}

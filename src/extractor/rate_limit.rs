//! Minimum-interval rate limiting
//!
//! One limiter instance is shared by every request of a run, at every level of
//! the hierarchy. The upstream API enforces its budget across the whole
//! integration, not per resource type.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::trace;

/// Temporal gate spacing consecutive requests by at least `min_interval`
#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_interval: Duration,
    last_permit: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    /// Create a limiter
    ///
    /// # Arguments
    /// * `min_interval` - Minimum spacing between two permitted calls
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_permit: Arc::new(Mutex::new(None)),
        }
    }

    /// Minimum spacing between two permitted calls
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until the next request may be issued.
    ///
    /// The first call returns immediately. Concurrent callers are admitted one
    /// at a time, in lock acquisition order, each `min_interval` apart.
    pub async fn throttle(&self) {
        let mut last = self.last_permit.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            if ready_at > Instant::now() {
                trace!(
                    wait_ms = (ready_at - Instant::now()).as_millis() as u64,
                    "Throttling request"
                );
                sleep_until(ready_at).await;
            }
        }

        *last = Some(Instant::now());
    }
}

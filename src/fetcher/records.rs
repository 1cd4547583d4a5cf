//! Record fetcher: one logical "fetch every page of this resource" operation
//!
//! Composes the [`CursorResolver`] and the shared [`RateLimiter`] over a
//! [`Transport`]. Pages are requested lazily: the next request is only issued
//! once the consumer has drained the records of the current page, so a caller
//! that stops early never pays for the remaining pages.

use futures_util::{stream, StreamExt};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use super::pagination::{CursorResolver, RecordsPath};
use super::{FetchOutcome, FetcherError, RecordStream, SkipReason, Transport, TransportResponse};
use crate::extractor::config::MAX_PAGES;
use crate::extractor::rate_limit::RateLimiter;
use crate::metrics;

/// One decoded page
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Records in arrival order
    pub records: Vec<Value>,
    /// Cursor of the following page, if any
    pub next_cursor: Option<String>,
}

enum PageState {
    Next { cursor: Option<String>, pages: usize },
    Done,
}

/// Paginated fetcher shared by every level of the hierarchy
#[derive(Clone)]
pub struct RecordFetcher {
    transport: Arc<dyn Transport>,
    rate_limiter: Arc<RateLimiter>,
    resolver: CursorResolver,
    requests: Arc<AtomicU64>,
}

impl RecordFetcher {
    /// Create a fetcher
    ///
    /// # Arguments
    /// * `transport` - HTTP collaborator
    /// * `rate_limiter` - Limiter shared by every request of the run
    /// * `page_size` - Page size limit sent as `limit`
    pub fn new(
        transport: Arc<dyn Transport>,
        rate_limiter: Arc<RateLimiter>,
        page_size: usize,
    ) -> Self {
        Self {
            transport,
            rate_limiter,
            resolver: CursorResolver::new(page_size),
            requests: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of requests issued through this fetcher (and its clones)
    pub fn requests_issued(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Page size limit
    pub fn page_size(&self) -> usize {
        self.resolver.page_size()
    }

    /// Fetch every record under `path`, page by page.
    ///
    /// The stream ends after the last page, after a [`FetchOutcome::Skip`],
    /// or after a [`FetchOutcome::Fatal`].
    pub fn fetch_all(&self, path: impl Into<String>, records_path: RecordsPath) -> RecordStream {
        let fetcher = self.clone();
        let path = path.into();

        let stream = stream::unfold(
            PageState::Next {
                cursor: None,
                pages: 0,
            },
            move |state| {
                let fetcher = fetcher.clone();
                let path = path.clone();

                async move {
                    let (cursor, pages) = match state {
                        PageState::Done => return None,
                        PageState::Next { cursor, pages } => (cursor, pages),
                    };

                    if pages >= MAX_PAGES {
                        let error = FetcherError::PageLimitExceeded { path, pages };
                        return Some((
                            stream::iter(vec![FetchOutcome::Fatal(error)]),
                            PageState::Done,
                        ));
                    }

                    match fetcher.fetch_page(&path, records_path, cursor.as_deref()).await {
                        FetchOutcome::Ok(page) => {
                            let next = match page.next_cursor {
                                Some(cursor) => PageState::Next {
                                    cursor: Some(cursor),
                                    pages: pages + 1,
                                },
                                None => {
                                    debug!(path = %path, pages = pages + 1, "Pagination complete");
                                    PageState::Done
                                }
                            };
                            let items: Vec<FetchOutcome<Value>> =
                                page.records.into_iter().map(FetchOutcome::Ok).collect();
                            Some((stream::iter(items), next))
                        }
                        FetchOutcome::Skip(reason) => {
                            Some((stream::iter(vec![FetchOutcome::Skip(reason)]), PageState::Done))
                        }
                        FetchOutcome::Fatal(e) => {
                            Some((stream::iter(vec![FetchOutcome::Fatal(e)]), PageState::Done))
                        }
                    }
                }
            },
        )
        .flatten();

        Box::pin(stream)
    }

    /// Fetch a single page and resolve its successor cursor
    pub async fn fetch_page(
        &self,
        path: &str,
        records_path: RecordsPath,
        cursor: Option<&str>,
    ) -> FetchOutcome<Page> {
        let query = self.resolver.query(cursor);

        debug!(path = %path, cursor = ?cursor, "Fetching page");

        let response = match self.request(path, &query).await {
            FetchOutcome::Ok(response) => response,
            FetchOutcome::Skip(reason) => return FetchOutcome::Skip(reason),
            FetchOutcome::Fatal(e) => return FetchOutcome::Fatal(e),
        };

        let records = match decode_body(&response).and_then(|body| records_path.extract(body)) {
            Some(records) => records,
            None => {
                warn!(
                    path = %path,
                    cursor = ?cursor,
                    "Malformed page, treating as end of data"
                );
                return FetchOutcome::Ok(Page {
                    records: Vec::new(),
                    next_cursor: None,
                });
            }
        };

        let next_cursor = self.resolver.next_cursor(&records, cursor);
        debug!(
            path = %path,
            records = records.len(),
            next_cursor = ?next_cursor,
            "Received page"
        );

        FetchOutcome::Ok(Page {
            records,
            next_cursor,
        })
    }

    /// Fetch a single, unpaginated record (e.g. a one-to-one detail).
    ///
    /// `Ok(None)` means the body held no record object.
    pub async fn fetch_one(&self, path: &str) -> FetchOutcome<Option<Value>> {
        let response = match self.request(path, &[]).await {
            FetchOutcome::Ok(response) => response,
            FetchOutcome::Skip(reason) => return FetchOutcome::Skip(reason),
            FetchOutcome::Fatal(e) => return FetchOutcome::Fatal(e),
        };

        let record = match decode_body(&response) {
            Some(Value::Object(map)) => Some(Value::Object(map)),
            Some(Value::Array(items)) => items.into_iter().find(Value::is_object),
            _ => None,
        };

        if record.is_none() {
            warn!(path = %path, "Response held no record object");
        }

        FetchOutcome::Ok(record)
    }

    /// Throttle, send and classify one request
    async fn request(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> FetchOutcome<TransportResponse> {
        self.rate_limiter.throttle().await;
        self.requests.fetch_add(1, Ordering::Relaxed);

        let started = Instant::now();
        let response = match self.transport.get(path, query).await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::Fatal(e),
        };
        metrics::record_request(response.status, started.elapsed());

        if response.is_success() {
            return FetchOutcome::Ok(response);
        }

        if let Some(reason) = SkipReason::from_status(response.status, path) {
            warn!(path = %path, status = response.status, "{}", reason);
            metrics::record_skip(&reason);
            return FetchOutcome::Skip(reason);
        }

        FetchOutcome::Fatal(FetcherError::UnexpectedStatus {
            status: response.status,
            path: path.to_string(),
            body: response.body_snippet(),
        })
    }
}

fn decode_body(response: &TransportResponse) -> Option<Value> {
    serde_json::from_slice(&response.body).ok()
}

//! Transport seam and paginated record fetching
//!
//! The fetcher layer turns "give me every record under this resource path"
//! into a lazy stream of [`FetchOutcome`] items. Transport failures are
//! classified here, at the narrowest scope:
//!
//! - 403 / 404 → [`FetchOutcome::Skip`]: the resource yields zero records and
//!   extraction continues with the next sibling
//! - any other non-2xx status → [`FetchOutcome::Fatal`]
//! - malformed pages → end of pagination, not an error

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use serde_json::Value;
use std::pin::Pin;

pub mod http;
pub mod pagination;
pub mod parser;
pub mod records;
pub mod shared_resources;

pub use pagination::{CursorResolver, RecordsPath};
pub use records::{Page, RecordFetcher};

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Non-2xx status that is not a skip
    #[error("unexpected status {status} for {path}: {body}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Resource path requested
        path: String,
        /// Response body (truncated)
        body: String,
    },

    /// Response parse error
    #[error("parse error: {0}")]
    ParseError(String),

    /// Rate limit still exceeded after retries
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    /// Network error
    #[error("network error: {0}")]
    NetworkError(String),

    /// Cursor never terminated
    #[error("pagination for {path} did not terminate after {pages} pages")]
    PageLimitExceeded {
        /// Resource path requested
        path: String,
        /// Pages fetched before giving up
        pages: usize,
    },
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Why a resource produced no records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// HTTP 403
    Forbidden {
        /// Resource path requested
        path: String,
    },
    /// HTTP 404
    NotFound {
        /// Resource path requested
        path: String,
    },
}

impl SkipReason {
    /// Classify a status code; `None` when the status is not skippable
    pub fn from_status(status: u16, path: &str) -> Option<Self> {
        match status {
            403 => Some(SkipReason::Forbidden {
                path: path.to_string(),
            }),
            404 => Some(SkipReason::NotFound {
                path: path.to_string(),
            }),
            _ => None,
        }
    }

    /// HTTP status behind the skip
    pub fn status(&self) -> u16 {
        match self {
            SkipReason::Forbidden { .. } => 403,
            SkipReason::NotFound { .. } => 404,
        }
    }

    /// Metric label
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::Forbidden { .. } => "forbidden",
            SkipReason::NotFound { .. } => "not_found",
        }
    }

    /// Resource path that was skipped
    pub fn path(&self) -> &str {
        match self {
            SkipReason::Forbidden { path } | SkipReason::NotFound { path } => path,
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Forbidden { path } => {
                write!(f, "access forbidden (403), skipping {path}")
            }
            SkipReason::NotFound { path } => {
                write!(f, "resource does not exist for this parent (404): {path}")
            }
        }
    }
}

/// Tagged result of a fetch step.
///
/// In a [`RecordStream`], `Skip` and `Fatal` are always the last item.
#[derive(Debug)]
pub enum FetchOutcome<T> {
    /// Data was fetched
    Ok(T),
    /// Resource skipped; zero records, siblings continue
    Skip(SkipReason),
    /// Run-aborting failure
    Fatal(FetcherError),
}

impl<T> FetchOutcome<T> {
    /// Transform the `Ok` payload
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> FetchOutcome<U> {
        match self {
            FetchOutcome::Ok(v) => FetchOutcome::Ok(f(v)),
            FetchOutcome::Skip(r) => FetchOutcome::Skip(r),
            FetchOutcome::Fatal(e) => FetchOutcome::Fatal(e),
        }
    }

    /// Whether this is a skip
    pub fn is_skip(&self) -> bool {
        matches!(self, FetchOutcome::Skip(_))
    }

    /// Whether this is a fatal failure
    pub fn is_fatal(&self) -> bool {
        matches!(self, FetchOutcome::Fatal(_))
    }
}

/// Lazy, single-pass stream of raw records
pub type RecordStream = Pin<Box<dyn Stream<Item = FetchOutcome<Value>> + Send>>;

/// Raw response as seen by the extraction core
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Undecoded body
    pub body: Bytes,
}

impl TransportResponse {
    /// Build a response from a status and a JSON value
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            body: Bytes::from(body.to_string()),
        }
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as lossy UTF-8, truncated for error messages
    pub fn body_snippet(&self) -> String {
        const MAX: usize = 512;
        let text = String::from_utf8_lossy(&self.body);
        match text.char_indices().nth(MAX) {
            Some((idx, _)) => format!("{}...", &text[..idx]),
            None => text.into_owned(),
        }
    }
}

/// Transport collaborator.
///
/// Owns base URL, authentication headers, connection reuse and HTTP-level
/// retry/backoff. The core only looks at the status and the body.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET for `path` (relative to the API base URL)
    async fn get(&self, path: &str, query: &[(String, String)]) -> FetcherResult<TransportResponse>;
}

//! Testing utilities including a scripted transport.
//!
//! [`MockTransport`] replays canned responses keyed by resource path and
//! cursor, and records every request so tests can assert on request counts,
//! order and cursors without a network.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::fetcher::pagination::CURSOR_PARAM;
use crate::fetcher::parser::CatalogParser;
use crate::fetcher::{FetcherError, FetcherResult, Transport, TransportResponse};

#[derive(Debug, Clone)]
enum MockResponse {
    Reply(TransportResponse),
    NetworkError(String),
}

type RouteKey = (String, Option<String>);

/// A scripted transport for testing.
///
/// Requests without a matching route get a 404, so a test only scripts the
/// resources it cares about.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    /// Responses by (path, cursor)
    routes: Arc<RwLock<HashMap<RouteKey, MockResponse>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockCall>>>,
}

/// Record of a request made to the mock transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// Resource path
    pub path: String,
    /// Query parameters in request order
    pub query: Vec<(String, String)>,
}

impl MockCall {
    /// Value of a query parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Cursor sent with the request, if any
    pub fn cursor(&self) -> Option<&str> {
        self.param(CURSOR_PARAM)
    }
}

impl MockTransport {
    /// Create a transport with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    fn route(self, path: &str, cursor: Option<&str>, response: MockResponse) -> Self {
        self.routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((path.to_string(), cursor.map(str::to_string)), response);
        self
    }

    /// Reply 200 with `body` to `path` requested with `cursor`.
    pub fn with_json(self, path: &str, cursor: Option<&str>, body: Value) -> Self {
        self.route(
            path,
            cursor,
            MockResponse::Reply(TransportResponse::json(200, &body)),
        )
    }

    /// Reply with an empty-bodied `status` to `path` requested with `cursor`.
    pub fn with_status(self, path: &str, cursor: Option<&str>, status: u16) -> Self {
        self.route(
            path,
            cursor,
            MockResponse::Reply(TransportResponse {
                status,
                body: bytes::Bytes::new(),
            }),
        )
    }

    /// Fail `path` requested with `cursor` with a network error.
    pub fn with_network_error(self, path: &str, cursor: Option<&str>, message: &str) -> Self {
        self.route(path, cursor, MockResponse::NetworkError(message.to_string()))
    }

    /// Script a paginated top-level-array resource.
    ///
    /// Each page after the first is keyed by the id of the last record of the
    /// page before it, mirroring last-seen-id cursors.
    pub fn with_pages(mut self, path: &str, pages: Vec<Vec<Value>>) -> Self {
        let mut cursor: Option<String> = None;
        for page in pages {
            let next = page
                .last()
                .and_then(|last| CatalogParser::record_id(last, "id"));
            self = self.with_json(path, cursor.as_deref(), Value::Array(page));
            cursor = next;
        }
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests received.
    pub fn call_count(&self) -> usize {
        self.calls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Requests made to one path.
    pub fn calls_to(&self, path: &str) -> Vec<MockCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.path == path)
            .collect()
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> FetcherResult<TransportResponse> {
        let call = MockCall {
            path: path.to_string(),
            query: query.to_vec(),
        };
        let key = (path.to_string(), call.cursor().map(str::to_string));

        self.calls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);

        let response = self
            .routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();

        match response {
            Some(MockResponse::Reply(response)) => Ok(response),
            Some(MockResponse::NetworkError(message)) => Err(FetcherError::NetworkError(message)),
            None => Ok(TransportResponse {
                status: 404,
                body: bytes::Bytes::from_static(b"{\"error\":\"not found\"}"),
            }),
        }
    }
}

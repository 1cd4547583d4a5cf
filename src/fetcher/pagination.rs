//! Cursor pagination
//!
//! The upstream API pages with a last-seen-id cursor: a full page means there
//! may be more, and the id of its last record is sent back as `cursor_key` to
//! ask for the next one. A short or empty page ends pagination.
//!
//! Pagination fails safe. A page whose shape is not recognised, a last record
//! without an id, or a cursor that does not advance all end the fetch instead
//! of looping.

use serde_json::Value;
use tracing::{debug, warn};

use super::parser::CatalogParser;

/// Query parameter carrying the page size
pub const LIMIT_PARAM: &str = "limit";

/// Query parameter carrying the cursor
pub const CURSOR_PARAM: &str = "cursor_key";

/// Where the record list lives in a response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordsPath {
    /// The body itself is the array
    Root,
    /// The array sits under this field of a top-level object.
    /// A bare top-level array is still accepted.
    Field(&'static str),
}

impl RecordsPath {
    /// Pull the record list out of a decoded body; `None` if malformed
    pub fn extract(&self, body: Value) -> Option<Vec<Value>> {
        match (self, body) {
            (_, Value::Array(items)) => Some(items),
            (RecordsPath::Field(field), Value::Object(mut map)) => match map.remove(*field) {
                Some(Value::Array(items)) => Some(items),
                Some(Value::Null) => Some(Vec::new()),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Decides whether another page exists and which cursor fetches it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorResolver {
    page_size: usize,
}

impl CursorResolver {
    /// Create a resolver for the configured page size limit
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    /// Page size limit
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Cursor for the page after `page`, or `None` when `page` was the last
    pub fn next_cursor(&self, page: &[Value], previous: Option<&str>) -> Option<String> {
        if page.is_empty() || page.len() < self.page_size {
            debug!(
                records = page.len(),
                page_size = self.page_size,
                "Short page, pagination complete"
            );
            return None;
        }

        let last = page.last()?;
        let Some(cursor) = CatalogParser::record_id(last, "id") else {
            warn!("Last record of a full page has no id, ending pagination");
            return None;
        };

        if previous == Some(cursor.as_str()) {
            warn!(cursor = %cursor, "Cursor did not advance, ending pagination");
            return None;
        }

        Some(cursor)
    }

    /// Query parameters for a page request
    pub fn query(&self, cursor: Option<&str>) -> Vec<(String, String)> {
        let mut params = vec![(LIMIT_PARAM.to_string(), self.page_size.to_string())];
        if let Some(cursor) = cursor {
            params.push((CURSOR_PARAM.to_string(), cursor.to_string()));
        }
        params
    }
}

impl Default for CursorResolver {
    fn default() -> Self {
        Self::new(crate::extractor::config::DEFAULT_PAGE_SIZE)
    }
}

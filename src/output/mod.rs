//! Record sinks

use crate::{CatalogRecord, StreamKind};

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonLinesSink;
pub use memory::MemorySink;

/// Output errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Buffer flush error
    #[error("flush error: {0}")]
    FlushError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for enriched records.
///
/// Records arrive one at a time, tagged with their stream, in emission order.
pub trait RecordSink {
    /// Accept one record
    fn write_record(&mut self, stream: StreamKind, record: &CatalogRecord) -> OutputResult<()>;

    /// Flush any buffered output
    fn flush(&mut self) -> OutputResult<()>;
}

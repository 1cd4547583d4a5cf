//! Line-delimited JSON sink
//!
//! Writes one JSON message per line. The first record of each stream is
//! preceded by a `SCHEMA` message describing the stream; every record is
//! written as a `RECORD` message stamped with its extraction time.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Stdout, Write};
use std::path::Path;
use tracing::{debug, info};

use super::{OutputError, OutputResult, RecordSink};
use crate::catalog;
use crate::extractor::config::FLUSH_INTERVAL;
use crate::{CatalogRecord, StreamKind};

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
enum Message<'a> {
    Schema {
        stream: &'a str,
        schema: Value,
        key_properties: &'a [&'a str],
    },
    Record {
        stream: &'a str,
        record: &'a CatalogRecord,
        time_extracted: String,
    },
}

/// Line-delimited JSON writer
pub struct JsonLinesSink<W: Write> {
    writer: BufWriter<W>,
    announced: HashSet<StreamKind>,
    records_written: u64,
}

impl JsonLinesSink<Stdout> {
    /// Sink writing to standard output
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl JsonLinesSink<File> {
    /// Sink writing to a new file, creating parent directories
    pub fn create<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        let path = path.as_ref();
        info!("Creating output file: path={}", path.display());

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::IoError(format!("Failed to create directory: {}", e)))?;
        }

        let file = File::create(path)
            .map_err(|e| OutputError::IoError(format!("Failed to create file: {}", e)))?;
        Ok(Self::new(file))
    }
}

impl<W: Write> JsonLinesSink<W> {
    /// Wrap any writer
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, writer),
            announced: HashSet::new(),
            records_written: 0,
        }
    }

    /// Number of RECORD messages written so far
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Flush and return the underlying writer
    pub fn into_inner(self) -> OutputResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {}", e.error())))
    }

    fn write_line(&mut self, message: &Message<'_>) -> OutputResult<()> {
        serde_json::to_writer(&mut self.writer, message)
            .map_err(|e| OutputError::SerializationError(e.to_string()))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| OutputError::IoError(e.to_string()))
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn write_record(&mut self, stream: StreamKind, record: &CatalogRecord) -> OutputResult<()> {
        if self.announced.insert(stream) {
            debug!(stream = %stream, "Writing schema");
            self.write_line(&Message::Schema {
                stream: stream.name(),
                schema: catalog::schema(stream),
                key_properties: stream.key_properties(),
            })?;
        }

        self.write_line(&Message::Record {
            stream: stream.name(),
            record,
            time_extracted: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })?;
        self.records_written += 1;

        if self.records_written % FLUSH_INTERVAL as u64 == 0 {
            self.flush()?;
            debug!("Progress: {} records written", self.records_written);
        }

        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {}", e)))
    }
}

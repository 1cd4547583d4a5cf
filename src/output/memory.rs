//! In-memory sink

use super::{OutputResult, RecordSink};
use crate::{CatalogRecord, SkillRef, StreamKind};

/// Collects every record in emission order
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Vec<(StreamKind, CatalogRecord)>,
    flushes: usize,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record received, in order
    pub fn records(&self) -> &[(StreamKind, CatalogRecord)] {
        &self.records
    }

    /// Records of one stream, in order
    pub fn stream(&self, stream: StreamKind) -> Vec<&CatalogRecord> {
        self.records
            .iter()
            .filter(|(kind, _)| *kind == stream)
            .map(|(_, record)| record)
            .collect()
    }

    /// Skill records of the industry and occupation skill streams, in order
    pub fn skills(&self) -> Vec<&SkillRef> {
        self.records
            .iter()
            .filter_map(|(_, record)| match record {
                CatalogRecord::Skill(skill) => Some(skill),
                _ => None,
            })
            .collect()
    }

    /// Number of records received
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing was received
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of flush calls
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// Take ownership of the collected records
    pub fn into_records(self) -> Vec<(StreamKind, CatalogRecord)> {
        self.records
    }
}

impl RecordSink for MemorySink {
    fn write_record(&mut self, stream: StreamKind, record: &CatalogRecord) -> OutputResult<()> {
        self.records.push((stream, record.clone()));
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.flushes += 1;
        Ok(())
    }
}

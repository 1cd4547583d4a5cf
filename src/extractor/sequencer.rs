//! Category fan-out with deterministic ranks
//!
//! A parent's skills are partitioned into categories (emerging, trending,
//! declining), each served from its own resource path. The sequencer fetches
//! the categories one after the other, in the given order, and numbers the
//! records of every `(parent_id, category)` partition `1, 2, 3, ...` in
//! arrival order.

use futures_util::{stream, Stream, StreamExt};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::context::{ChildContext, PathTemplate};
use super::{ExtractError, ExtractResult};
use crate::fetcher::parser::CatalogParser;
use crate::fetcher::{FetchOutcome, RecordFetcher, RecordsPath, SkipReason};
use crate::{SkillCategory, SkillRef, StreamKind};

/// Rank counter table keyed by `(parent_id, category)`.
///
/// Create one per child stream per run, since industry and occupation ids
/// may collide; clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct RankCounters {
    counters: Arc<Mutex<HashMap<(String, SkillCategory), u32>>>,
}

impl RankCounters {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the partition's counter and return the new rank (starts at 1)
    pub fn next_rank(&self, parent_id: &str, category: SkillCategory) -> u32 {
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        let counter = counters
            .entry((parent_id.to_string(), category))
            .or_insert(0);
        *counter += 1;
        *counter
    }

    /// Last rank handed out for the partition, 0 if none
    pub fn current(&self, parent_id: &str, category: SkillCategory) -> u32 {
        let counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters
            .get(&(parent_id.to_string(), category))
            .copied()
            .unwrap_or(0)
    }

    /// Number of partitions seen so far
    pub fn partitions(&self) -> usize {
        self.counters.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// One step of a parent's fan-out
#[derive(Debug, Clone, PartialEq)]
pub enum FanOutItem {
    /// Enriched, ranked child record
    Ranked(SkillRef),
    /// The category's resource was skipped (403/404); it contributes no records
    Skipped {
        /// Category that was skipped
        category: SkillCategory,
        /// Why
        reason: SkipReason,
    },
}

/// Lazy fan-out stream. An `Err` item is always the last one consumed.
pub type FanOutStream = Pin<Box<dyn Stream<Item = ExtractResult<FanOutItem>> + Send>>;

/// Category fan-out sequencer for one child stream
#[derive(Clone)]
pub struct CategorySequencer {
    fetcher: RecordFetcher,
    counters: RankCounters,
    template: PathTemplate,
    stream: StreamKind,
}

impl CategorySequencer {
    /// Create a sequencer
    ///
    /// # Arguments
    /// * `fetcher` - Record fetcher shared by the run
    /// * `counters` - Rank table of the current run
    /// * `template` - Child path template with a `{category}` placeholder
    /// * `stream` - Stream the ranked records are emitted on
    pub fn new(
        fetcher: RecordFetcher,
        counters: RankCounters,
        template: PathTemplate,
        stream: StreamKind,
    ) -> Self {
        Self {
            fetcher,
            counters,
            template,
            stream,
        }
    }

    /// Rank table in use
    pub fn counters(&self) -> &RankCounters {
        &self.counters
    }

    /// Fetch every category for the parent in `ctx`, in order.
    ///
    /// Categories are fetched strictly one after the other; the next category's
    /// first request is only issued once the previous one is drained.
    pub fn expand(&self, ctx: &ChildContext, categories: &[SkillCategory]) -> FanOutStream {
        let sequencer = self.clone();
        let ctx = ctx.clone();

        let items = stream::iter(categories.to_vec())
            .flat_map(move |category| sequencer.expand_category(&ctx, category));

        Box::pin(items)
    }

    fn expand_category(&self, ctx: &ChildContext, category: SkillCategory) -> FanOutStream {
        let path = match ctx.render(&self.template, Some(category)) {
            Ok(path) => path,
            Err(e) => return Box::pin(stream::iter(vec![Err(e)])),
        };

        debug!(
            stream = %self.stream,
            parent_id = %ctx.parent_id,
            category = %category,
            path = %path,
            "Fetching category"
        );

        let counters = self.counters.clone();
        let stream_kind = self.stream;
        let parent_id = ctx.parent_id.clone();
        let country_code = ctx.country_code.clone();

        let items = self
            .fetcher
            .fetch_all(path, RecordsPath::Root)
            .map(move |outcome| -> ExtractResult<FanOutItem> {
                match outcome {
                    FetchOutcome::Ok(raw) => {
                        let named =
                            CatalogParser::parse_named(raw).map_err(|e| ExtractError::Schema {
                                stream: stream_kind.name(),
                                message: e.to_string(),
                            })?;
                        let rank = counters.next_rank(&parent_id, category);
                        Ok(FanOutItem::Ranked(SkillRef {
                            id: named.id,
                            name: named.name,
                            description: named.description,
                            rank,
                            category,
                            parent_id: parent_id.clone(),
                            country_code: country_code.clone(),
                        }))
                    }
                    FetchOutcome::Skip(reason) => Ok(FanOutItem::Skipped { category, reason }),
                    FetchOutcome::Fatal(e) => Err(ExtractError::Fetcher(e)),
                }
            });

        Box::pin(items)
    }
}

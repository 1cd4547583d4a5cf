//! Hierarchy orchestrator
//!
//! Drives one extraction run over the selected stream groups:
//!
//! ```text
//! START → ROOT_FETCH → (per root record: CONTEXT_DERIVE → CHILD_FETCH*) → DONE
//!                                                       any fatal failure → ERROR
//! ```
//!
//! Extraction is depth-first and sequential: one parent at a time, one category
//! at a time, one page at a time. Each root record is emitted before its
//! children.

use futures_util::StreamExt;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::context::{ChildContext, ContextPropagator, PathTemplate};
use super::rate_limit::RateLimiter;
use super::sequencer::{CategorySequencer, FanOutItem, RankCounters};
use super::{ExtractError, ExtractResult};
use crate::config::{ConfigError, RunConfig, StreamGroup, StreamSelection};
use crate::fetcher::http::HttpTransport;
use crate::fetcher::parser::CatalogParser;
use crate::fetcher::{FetchOutcome, FetcherError, RecordFetcher, RecordsPath, Transport};
use crate::metrics;
use crate::output::RecordSink;
use crate::shutdown::SharedShutdown;
use crate::{CatalogRecord, SkillCategory, StreamKind};

/// Run state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Nothing fetched yet
    Start,
    /// Fetching root records of a hierarchy
    RootFetch,
    /// Deriving a root record's child context
    ContextDerive,
    /// Fetching a root record's children
    ChildFetch,
    /// Run finished
    Done,
    /// Run aborted by a fatal failure
    Error,
}

/// A hierarchy aborted by a schema error
#[derive(Debug)]
pub struct HierarchyFailure {
    /// Group that was aborted
    pub group: StreamGroup,
    /// Why
    pub error: ExtractError,
}

/// Outcome of a completed run
#[derive(Debug)]
pub struct RunSummary {
    /// Records emitted per stream
    pub records: BTreeMap<StreamKind, u64>,
    /// Sub-resources skipped after 403/404
    pub skipped: u64,
    /// Requests issued
    pub requests: u64,
    /// Final state
    pub state: RunState,
    /// Hierarchies aborted by schema errors
    pub failures: Vec<HierarchyFailure>,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
            skipped: 0,
            requests: 0,
            state: RunState::Start,
            failures: Vec::new(),
        }
    }
}

impl RunSummary {
    /// Records emitted across every stream
    pub fn total_records(&self) -> u64 {
        self.records.values().sum()
    }

    /// Records emitted on one stream
    pub fn records_for(&self, stream: StreamKind) -> u64 {
        self.records.get(&stream).copied().unwrap_or(0)
    }

    /// Whether every selected hierarchy completed
    pub fn is_success(&self) -> bool {
        self.state == RunState::Done && self.failures.is_empty()
    }
}

/// Static description of a parent → children hierarchy
struct Hierarchy {
    root_path: &'static str,
    root_stream: StreamKind,
    propagator: ContextPropagator,
    skills_template: PathTemplate,
    skills_stream: StreamKind,
    detail_template: Option<PathTemplate>,
}

const INDUSTRIES: Hierarchy = Hierarchy {
    root_path: "/industries",
    root_stream: StreamKind::Industries,
    propagator: ContextPropagator::INDUSTRY,
    skills_template: PathTemplate::INDUSTRY_SKILLS,
    skills_stream: StreamKind::IndustrySkills,
    detail_template: None,
};

const OCCUPATIONS: Hierarchy = Hierarchy {
    root_path: "/occupations",
    root_stream: StreamKind::Occupations,
    propagator: ContextPropagator::OCCUPATION,
    skills_template: PathTemplate::OCCUPATION_SKILLS,
    skills_stream: StreamKind::OccupationSkills,
    detail_template: Some(PathTemplate::OCCUPATION_DETAIL),
};

const SKILLS_PATH: &str = "/skills";

/// Top-level extraction driver
pub struct HierarchyOrchestrator {
    config: RunConfig,
    fetcher: RecordFetcher,
    selection: StreamSelection,
    categories: Vec<SkillCategory>,
    country_code: String,
    shutdown: Option<SharedShutdown>,
    state: Mutex<RunState>,
}

impl HierarchyOrchestrator {
    /// Create an orchestrator over any transport.
    ///
    /// The configuration is validated here, before any request is issued.
    pub fn new(config: RunConfig, transport: Arc<dyn Transport>) -> ExtractResult<Self> {
        config.validate()?;

        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit_interval()));
        let fetcher = RecordFetcher::new(transport, rate_limiter, config.page_size());

        Ok(Self {
            selection: config.stream_selection()?,
            categories: config.categories()?,
            country_code: config.country_code()?.to_string(),
            fetcher,
            config,
            shutdown: None,
            state: Mutex::new(RunState::Start),
        })
    }

    /// Create an orchestrator over the HTTP transport
    pub fn from_config(config: RunConfig) -> ExtractResult<Self> {
        let transport = HttpTransport::from_config(&config)?;
        Self::new(config, Arc::new(transport))
    }

    /// Stop at the next parent or page boundary once shutdown is requested
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Current run state
    pub fn state(&self) -> RunState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Groups selected for this orchestrator
    pub fn selection(&self) -> &StreamSelection {
        &self.selection
    }

    fn set_state(&self, state: RunState) {
        let mut current = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let previous = *current;
        if previous != state {
            debug!(from = ?previous, to = ?state, "Run state transition");
            *current = state;
        }
    }

    fn check_shutdown(&self) -> ExtractResult<()> {
        match &self.shutdown {
            Some(shutdown) if shutdown.is_shutdown_requested() => Err(ExtractError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Run every selected hierarchy and write the records to `sink`.
    ///
    /// Each hierarchy gets its own rank table, created fresh for each call, so
    /// an occupation never continues the ranks of an industry with the same
    /// id. A schema error aborts only its hierarchy and is reported in
    /// [`RunSummary::failures`]; any other error aborts the run.
    pub async fn run<S: RecordSink + ?Sized>(&self, sink: &mut S) -> ExtractResult<RunSummary> {
        self.set_state(RunState::Start);
        let requests_before = self.fetcher.requests_issued();
        let mut summary = RunSummary::default();

        info!(
            groups = ?self.selection.groups().iter().map(|g| g.name()).collect::<Vec<_>>(),
            categories = ?self.categories.iter().map(|c| c.as_str()).collect::<Vec<_>>(),
            country_code = %self.country_code,
            page_size = self.fetcher.page_size(),
            "Starting extraction"
        );

        for &group in self.selection.groups() {
            let span = info_span!("hierarchy", group = group.name());
            let result = self
                .run_group(group, sink, &mut summary)
                .instrument(span)
                .await;

            match result {
                Ok(()) => {}
                Err(e) if e.is_schema_error() => {
                    error!(group = group.name(), error = %e, "Hierarchy aborted");
                    summary.failures.push(HierarchyFailure { group, error: e });
                }
                Err(e) => {
                    self.set_state(RunState::Error);
                    if let Err(flush_error) = sink.flush() {
                        warn!(error = %flush_error, "Failed to flush sink after fatal error");
                    }
                    error!(
                        group = group.name(),
                        records = summary.total_records(),
                        error = %e,
                        "Extraction failed"
                    );
                    return Err(e);
                }
            }
        }

        sink.flush()?;
        self.set_state(RunState::Done);
        summary.state = RunState::Done;
        summary.requests = self.fetcher.requests_issued() - requests_before;

        info!(
            records = summary.total_records(),
            skipped = summary.skipped,
            requests = summary.requests,
            failures = summary.failures.len(),
            "Extraction finished"
        );

        Ok(summary)
    }

    async fn run_group<S: RecordSink + ?Sized>(
        &self,
        group: StreamGroup,
        sink: &mut S,
        summary: &mut RunSummary,
    ) -> ExtractResult<()> {
        match group {
            StreamGroup::IndustrySkills => {
                self.run_hierarchy(&INDUSTRIES, sink, summary).await
            }
            StreamGroup::OccupationSkills => {
                self.run_hierarchy(&OCCUPATIONS, sink, summary).await
            }
            StreamGroup::SkillList => self.run_skills_list(sink, summary).await,
            StreamGroup::All => Err(ExtractError::Config(ConfigError::InvalidValue {
                field: "stream_group",
                message: "`all` must be resolved into concrete groups before a run".to_string(),
            })),
        }
    }

    async fn run_hierarchy<S: RecordSink + ?Sized>(
        &self,
        hierarchy: &Hierarchy,
        sink: &mut S,
        summary: &mut RunSummary,
    ) -> ExtractResult<()> {
        info!(stream = %hierarchy.root_stream, path = hierarchy.root_path, "Fetching roots");
        self.set_state(RunState::RootFetch);

        let sequencer = CategorySequencer::new(
            self.fetcher.clone(),
            RankCounters::new(),
            hierarchy.skills_template,
            hierarchy.skills_stream,
        );

        let mut roots = self.fetcher.fetch_all(hierarchy.root_path, RecordsPath::Root);
        let mut parents = 0u64;

        while let Some(outcome) = roots.next().await {
            self.check_shutdown()?;

            let raw = match outcome {
                FetchOutcome::Ok(raw) => raw,
                FetchOutcome::Skip(_) => {
                    summary.skipped += 1;
                    break;
                }
                FetchOutcome::Fatal(e) => return Err(e.into()),
            };

            self.set_state(RunState::ContextDerive);
            let ctx = hierarchy.propagator.derive_child_context(&raw, &self.config)?;
            let root = parse_root(hierarchy.root_stream, raw, &ctx.country_code)
                .map_err(|e| schema_error(hierarchy.root_stream, e))?;
            self.emit(sink, summary, hierarchy.root_stream, root)?;

            self.set_state(RunState::ChildFetch);
            self.fan_out(&sequencer, hierarchy.skills_stream, &ctx, sink, summary)
                .await?;
            if let Some(template) = hierarchy.detail_template {
                self.fetch_detail(template, &ctx, sink, summary).await?;
            }

            parents += 1;
            self.set_state(RunState::RootFetch);
        }

        info!(
            stream = %hierarchy.root_stream,
            parents,
            children = summary.records_for(hierarchy.skills_stream),
            "Hierarchy complete"
        );
        Ok(())
    }

    async fn fan_out<S: RecordSink + ?Sized>(
        &self,
        sequencer: &CategorySequencer,
        stream: StreamKind,
        ctx: &ChildContext,
        sink: &mut S,
        summary: &mut RunSummary,
    ) -> ExtractResult<()> {
        let mut items = sequencer.expand(ctx, &self.categories);

        while let Some(item) = items.next().await {
            self.check_shutdown()?;
            match item? {
                FanOutItem::Ranked(skill) => {
                    self.emit(sink, summary, stream, CatalogRecord::Skill(skill))?;
                }
                FanOutItem::Skipped { category, reason } => {
                    debug!(
                        parent_id = %ctx.parent_id,
                        category = %category,
                        status = reason.status(),
                        "Category skipped"
                    );
                    summary.skipped += 1;
                }
            }
        }

        Ok(())
    }

    async fn fetch_detail<S: RecordSink + ?Sized>(
        &self,
        template: PathTemplate,
        ctx: &ChildContext,
        sink: &mut S,
        summary: &mut RunSummary,
    ) -> ExtractResult<()> {
        let path = ctx.render(&template, None)?;

        match self.fetcher.fetch_one(&path).await {
            FetchOutcome::Ok(Some(raw)) => {
                // A malformed detail loses only that detail, never the hierarchy
                let record =
                    CatalogParser::parse_occupation_detail(raw, &ctx.parent_id, &ctx.country_code)
                        .map(CatalogRecord::OccupationDetail)
                        .map_err(|e| e.to_string())
                        .and_then(|record| record.validate().map(|_| record));
                match record {
                    Ok(record) => {
                        self.emit(sink, summary, StreamKind::OccupationDetails, record)
                    }
                    Err(message) => {
                        warn!(
                            path = %path,
                            parent_id = %ctx.parent_id,
                            error = %message,
                            "Skipping malformed occupation detail"
                        );
                        summary.skipped += 1;
                        Ok(())
                    }
                }
            }
            FetchOutcome::Ok(None) => Ok(()),
            FetchOutcome::Skip(_) => {
                summary.skipped += 1;
                Ok(())
            }
            FetchOutcome::Fatal(e) => Err(e.into()),
        }
    }

    async fn run_skills_list<S: RecordSink + ?Sized>(
        &self,
        sink: &mut S,
        summary: &mut RunSummary,
    ) -> ExtractResult<()> {
        info!(stream = %StreamKind::SkillsList, path = SKILLS_PATH, "Fetching skills catalog");
        self.set_state(RunState::RootFetch);

        let mut entries = self
            .fetcher
            .fetch_all(SKILLS_PATH, RecordsPath::Field("skills"));

        while let Some(outcome) = entries.next().await {
            self.check_shutdown()?;
            match outcome {
                FetchOutcome::Ok(raw) => {
                    let entry = CatalogParser::parse_catalog_entry(raw)
                        .map_err(|e| schema_error(StreamKind::SkillsList, e))?;
                    let record = CatalogRecord::CatalogEntry(entry);
                    self.emit(sink, summary, StreamKind::SkillsList, record)?;
                }
                FetchOutcome::Skip(_) => summary.skipped += 1,
                FetchOutcome::Fatal(e) => return Err(e.into()),
            }
        }

        info!(
            stream = %StreamKind::SkillsList,
            records = summary.records_for(StreamKind::SkillsList),
            "Stream complete"
        );
        Ok(())
    }

    fn emit<S: RecordSink + ?Sized>(
        &self,
        sink: &mut S,
        summary: &mut RunSummary,
        stream: StreamKind,
        record: CatalogRecord,
    ) -> ExtractResult<()> {
        record
            .validate()
            .map_err(|message| ExtractError::Schema {
                stream: stream.name(),
                message,
            })?;

        sink.write_record(stream, &record)?;
        *summary.records.entry(stream).or_insert(0) += 1;
        metrics::record_emitted(stream);
        Ok(())
    }
}

fn parse_root(
    stream: StreamKind,
    raw: Value,
    country_code: &str,
) -> Result<CatalogRecord, FetcherError> {
    match stream {
        StreamKind::Occupations => {
            CatalogParser::parse_occupation(raw, country_code).map(CatalogRecord::Occupation)
        }
        StreamKind::Industries => {
            CatalogParser::parse_industry(raw, country_code).map(CatalogRecord::Industry)
        }
        other => Err(FetcherError::ParseError(format!(
            "{other} is not a root stream"
        ))),
    }
}

fn schema_error(stream: StreamKind, error: FetcherError) -> ExtractError {
    ExtractError::Schema {
        stream: stream.name(),
        message: error.to_string(),
    }
}

//! # Skills Catalog Extractor Library
//!
//! Extracts hierarchical workforce catalog data (industries, occupations and
//! the skills associated with them) from a paginated REST API and emits it as
//! a sequence of typed, schema-conformant records.
//!
//! ## Features
//!
//! - **Hierarchy Walking**: Industry → skills, Occupation → skills + detail
//! - **Context Propagation**: Parent ids and run-level country code stamped onto children
//! - **Cursor Pagination**: Last-seen-id cursors driven to completion per sub-resource
//! - **Deterministic Ranks**: 1-based ranks per (parent, category) partition
//! - **Partial Failure Tolerance**: 403/404 on one branch never aborts its siblings
//! - **Rate Limiting**: One global minimum-interval gate across every request
//!
//! ## Quick Start
//!
//! ```no_run
//! use skills_catalog_extractor::config::RunConfig;
//! use skills_catalog_extractor::extractor::HierarchyOrchestrator;
//! use skills_catalog_extractor::output::jsonl::JsonLinesSink;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunConfig::load("config.json")?;
//! let orchestrator = HierarchyOrchestrator::from_config(config)?;
//!
//! let mut sink = JsonLinesSink::stdout();
//! let summary = orchestrator.run(&mut sink).await?;
//! println!("emitted {} records", summary.total_records());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`config`] - Run configuration and stream group selection
//! - [`fetcher`] - Transport seam, cursor pagination and record fetching
//! - [`extractor`] - Rate limiting, context propagation, category fan-out and orchestration
//! - [`output`] - Record sinks (line-delimited JSON, in-memory)
//! - [`catalog`] - Stream descriptors and JSON schemas
//!
//! ## Data Types
//!
//! - [`Industry`] / [`Occupation`] - Root entities
//! - [`SkillRef`] - Ranked skill under an industry or occupation
//! - [`SkillCatalogEntry`] - Standalone skills catalog entry
//! - [`OccupationDetail`] - One-to-one occupation detail

#![warn(missing_docs)]
#![warn(clippy::all)]

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Stream catalog and JSON schemas
pub mod catalog;

/// CLI command implementations
pub mod cli;

/// Run configuration
pub mod config;

/// Extraction engine: rate limiting, context propagation, fan-out, orchestration
pub mod extractor;

/// Transport seam and paginated record fetching
pub mod fetcher;

/// Extraction metrics
pub mod metrics;

/// Record sinks
pub mod output;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

/// Scripted transport for tests
pub mod testing;

pub use config::{RunConfig, StreamGroup};

/// Industry root record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Industry {
    /// Industry identifier
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Country code taken from run configuration
    pub country_code: String,
}

impl Industry {
    /// Validate industry data integrity
    pub fn validate(&self) -> Result<(), String> {
        require_non_empty("id", &self.id)?;
        require_non_empty("country_code", &self.country_code)
    }
}

/// Occupation root record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Occupation {
    /// Occupation identifier
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Free-text description
    pub description: Option<String>,
    /// Country code taken from run configuration
    pub country_code: String,
}

impl Occupation {
    /// Validate occupation data integrity
    pub fn validate(&self) -> Result<(), String> {
        require_non_empty("id", &self.id)?;
        require_non_empty("country_code", &self.country_code)
    }
}

/// Skill category partition of a parent's skills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillCategory {
    /// Skills growing in demand
    Emerging,
    /// Skills currently in high demand
    Trending,
    /// Skills falling in demand
    Declining,
}

impl SkillCategory {
    /// Default fan-out order
    pub const ALL: [SkillCategory; 3] = [
        SkillCategory::Emerging,
        SkillCategory::Trending,
        SkillCategory::Declining,
    ];

    /// Path segment and wire name for this category
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillCategory::Emerging => "emerging",
            SkillCategory::Trending => "trending",
            SkillCategory::Declining => "declining",
        }
    }
}

impl std::fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "emerging" => Ok(SkillCategory::Emerging),
            "trending" => Ok(SkillCategory::Trending),
            "declining" => Ok(SkillCategory::Declining),
            _ => Err(format!(
                "Invalid skills category: {s}. Valid options: emerging, trending, declining"
            )),
        }
    }
}

/// Skill attached to an industry or occupation.
///
/// `rank` is assigned during extraction: the 1-based arrival position of the
/// record within its `(parent_id, category)` partition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillRef {
    /// Skill identifier
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Free-text description
    pub description: Option<String>,
    /// Extraction-assigned rank (>= 1)
    pub rank: u32,
    /// Category the skill was fetched under
    pub category: SkillCategory,
    /// Industry or occupation id of the parent record
    pub parent_id: String,
    /// Country code taken from run configuration
    pub country_code: String,
}

impl SkillRef {
    /// Validate skill reference integrity
    pub fn validate(&self) -> Result<(), String> {
        require_non_empty("id", &self.id)?;
        require_non_empty("parent_id", &self.parent_id)?;
        require_non_empty("country_code", &self.country_code)?;
        if self.rank == 0 {
            return Err("Rank must be >= 1, got 0".to_string());
        }
        Ok(())
    }
}

/// Entry of the standalone skills catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillCatalogEntry {
    /// Skill identifier
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Free-text description
    pub description: Option<String>,
}

impl SkillCatalogEntry {
    /// Validate catalog entry integrity
    pub fn validate(&self) -> Result<(), String> {
        require_non_empty("id", &self.id)
    }
}

/// Skill ranked by how often it is mentioned for an occupation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SkillMention {
    /// Skill identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Free-text description
    #[serde(default)]
    pub description: Option<String>,
    /// Number of mentions
    #[serde(default)]
    pub mentions: Option<u64>,
    /// Share of the occupation attributed to this skill
    #[serde(default, serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub skill_percentage: Option<Decimal>,
}

/// Skill specific to an occupation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SpecificSkill {
    /// Skill identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Free-text description
    #[serde(default)]
    pub description: Option<String>,
    /// Share of the occupation attributed to this skill
    #[serde(default, serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub skill_percentage: Option<Decimal>,
}

/// Task performed within an occupation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OccupationTask {
    /// Task identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Share of working time spent on the task
    #[serde(default, serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub time_percent: Option<Decimal>,
    /// Free-text description
    #[serde(default)]
    pub description: Option<String>,
}

/// One-to-one detail record of an occupation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OccupationDetail {
    /// Occupation identifier
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Free-text description
    pub description: Option<String>,
    /// Category the occupation belongs to
    pub category_name: Option<String>,
    /// Occupation stream (career track)
    pub stream: Option<String>,
    /// Common job titles, in upstream order
    pub common_role_names: Vec<String>,
    /// Seniority level
    pub level: Option<String>,
    /// Most-mentioned skills, in upstream order
    pub top_skills_mentions: Vec<SkillMention>,
    /// Most specific skills, in upstream order
    pub top_skills_specific: Vec<SpecificSkill>,
    /// Main tasks, in upstream order
    pub top_tasks: Vec<OccupationTask>,
    /// Country code taken from run configuration
    pub country_code: String,
}

impl OccupationDetail {
    /// Validate occupation detail integrity
    pub fn validate(&self) -> Result<(), String> {
        require_non_empty("id", &self.id)?;
        require_non_empty("country_code", &self.country_code)?;

        for mention in &self.top_skills_mentions {
            check_percentage("top_skills_mentions.skill_percentage", mention.skill_percentage)?;
        }
        for skill in &self.top_skills_specific {
            check_percentage("top_skills_specific.skill_percentage", skill.skill_percentage)?;
        }
        for task in &self.top_tasks {
            check_percentage("top_tasks.time_percent", task.time_percent)?;
        }
        Ok(())
    }
}

/// Any record the extractor emits
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum CatalogRecord {
    /// Industry root record
    Industry(Industry),
    /// Occupation root record
    Occupation(Occupation),
    /// Ranked skill under a parent
    Skill(SkillRef),
    /// Skills catalog entry
    CatalogEntry(SkillCatalogEntry),
    /// Occupation detail
    OccupationDetail(OccupationDetail),
}

impl CatalogRecord {
    /// Identifier of the wrapped record
    pub fn id(&self) -> &str {
        match self {
            CatalogRecord::Industry(r) => &r.id,
            CatalogRecord::Occupation(r) => &r.id,
            CatalogRecord::Skill(r) => &r.id,
            CatalogRecord::CatalogEntry(r) => &r.id,
            CatalogRecord::OccupationDetail(r) => &r.id,
        }
    }

    /// Validate the wrapped record
    pub fn validate(&self) -> Result<(), String> {
        match self {
            CatalogRecord::Industry(r) => r.validate(),
            CatalogRecord::Occupation(r) => r.validate(),
            CatalogRecord::Skill(r) => r.validate(),
            CatalogRecord::CatalogEntry(r) => r.validate(),
            CatalogRecord::OccupationDetail(r) => r.validate(),
        }
    }
}

/// Output stream a record is emitted on (its entity-type tag)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// `/industries`
    Industries,
    /// `/industries/{industry_id}/skills/{category}`
    IndustrySkills,
    /// `/occupations`
    Occupations,
    /// `/occupations/{occupation_id}/skills/{category}`
    OccupationSkills,
    /// `/occupations/{occupation_id}`
    OccupationDetails,
    /// `/skills`
    SkillsList,
}

impl StreamKind {
    /// Every stream, in catalog order
    pub const ALL: [StreamKind; 6] = [
        StreamKind::Industries,
        StreamKind::IndustrySkills,
        StreamKind::Occupations,
        StreamKind::OccupationSkills,
        StreamKind::OccupationDetails,
        StreamKind::SkillsList,
    ];

    /// Stream name used on the wire
    pub fn name(&self) -> &'static str {
        match self {
            StreamKind::Industries => "industries",
            StreamKind::IndustrySkills => "industry_skills",
            StreamKind::Occupations => "occupations",
            StreamKind::OccupationSkills => "occupation_skills",
            StreamKind::OccupationDetails => "occupation_details",
            StreamKind::SkillsList => "skills_list",
        }
    }

    /// Primary key columns of the stream
    pub fn key_properties(&self) -> &'static [&'static str] {
        match self {
            StreamKind::IndustrySkills | StreamKind::OccupationSkills => {
                &["id", "parent_id", "category"]
            }
            _ => &["id"],
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StreamKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StreamKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("Invalid stream: {s}"))
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} cannot be empty"));
    }
    Ok(())
}

fn check_percentage(field: &str, value: Option<Decimal>) -> Result<(), String> {
    match value {
        Some(v) if v < Decimal::ZERO => Err(format!("{field} must be non-negative, got {v}")),
        _ => Ok(()),
    }
}

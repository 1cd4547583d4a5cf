//! Run configuration
//!
//! A run is configured from a flat JSON mapping:
//!
//! ```json
//! {
//!   "api_base_url": "https://api.example.com/v1",
//!   "api_key": "secret",
//!   "country_code": "US",
//!   "page_size": 50,
//!   "skills_category": "emerging",
//!   "stream_group": "industry_skills,skill_list"
//! }
//! ```
//!
//! Only `api_base_url`, `api_key` and `country_code` are required. Everything
//! is validated once, before the first request is issued.

use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::extractor::config::{
    DEFAULT_PAGE_SIZE, DEFAULT_RATE_LIMIT_INTERVAL_MS, DEFAULT_REQUEST_TIMEOUT_SECS, MAX_RETRIES,
};
use crate::{SkillCategory, StreamKind};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required key is absent or empty
    #[error("missing required configuration: {0}")]
    MissingField(&'static str),

    /// A key holds an unusable value
    #[error("invalid configuration value for {field}: {message}")]
    InvalidValue {
        /// Offending key
        field: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// Config file could not be read
    #[error("failed to read config file: {0}")]
    Io(String),

    /// Config file is not valid JSON
    #[error("failed to parse config file: {0}")]
    Parse(String),
}

/// Hierarchy selection unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StreamGroup {
    /// industries → industry skills
    IndustrySkills,
    /// occupations → occupation skills + occupation details
    OccupationSkills,
    /// standalone skills catalog
    SkillList,
    /// every group
    All,
}

impl StreamGroup {
    /// Concrete groups in execution order
    pub const CONCRETE: [StreamGroup; 3] = [
        StreamGroup::IndustrySkills,
        StreamGroup::OccupationSkills,
        StreamGroup::SkillList,
    ];

    /// Configuration name of the group
    pub fn name(&self) -> &'static str {
        match self {
            StreamGroup::IndustrySkills => "industry_skills",
            StreamGroup::OccupationSkills => "occupation_skills",
            StreamGroup::SkillList => "skill_list",
            StreamGroup::All => "all",
        }
    }

    /// Streams emitted by this group
    pub fn streams(&self) -> Vec<StreamKind> {
        match self {
            StreamGroup::IndustrySkills => vec![StreamKind::Industries, StreamKind::IndustrySkills],
            StreamGroup::OccupationSkills => vec![
                StreamKind::Occupations,
                StreamKind::OccupationSkills,
                StreamKind::OccupationDetails,
            ],
            StreamGroup::SkillList => vec![StreamKind::SkillsList],
            StreamGroup::All => StreamKind::ALL.to_vec(),
        }
    }
}

impl std::fmt::Display for StreamGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StreamGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "industry_skills" => Ok(StreamGroup::IndustrySkills),
            "occupation_skills" => Ok(StreamGroup::OccupationSkills),
            "skill_list" | "skills_list" => Ok(StreamGroup::SkillList),
            "all" => Ok(StreamGroup::All),
            _ => Err(format!(
                "Invalid stream group: {s}. Valid options: industry_skills, occupation_skills, skill_list, all"
            )),
        }
    }
}

/// Resolved, de-duplicated set of concrete groups to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSelection {
    groups: Vec<StreamGroup>,
}

impl StreamSelection {
    /// Every concrete group
    pub fn all() -> Self {
        Self {
            groups: StreamGroup::CONCRETE.to_vec(),
        }
    }

    /// Resolve a list of group names; `all` anywhere selects everything
    pub fn from_groups(groups: &[StreamGroup]) -> Self {
        if groups.is_empty() || groups.contains(&StreamGroup::All) {
            return Self::all();
        }
        let groups = StreamGroup::CONCRETE
            .into_iter()
            .filter(|g| groups.contains(g))
            .collect();
        Self { groups }
    }

    /// Parse names such as `"industry_skills,skill_list"`
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, ConfigError> {
        let mut groups = Vec::new();
        for name in names {
            for part in name.as_ref().split(',').filter(|p| !p.trim().is_empty()) {
                let group = StreamGroup::from_str(part).map_err(|message| {
                    ConfigError::InvalidValue {
                        field: "stream_group",
                        message,
                    }
                })?;
                groups.push(group);
            }
        }
        Ok(Self::from_groups(&groups))
    }

    /// Concrete groups in execution order
    pub fn groups(&self) -> &[StreamGroup] {
        &self.groups
    }

    /// Whether a group is selected
    pub fn contains(&self, group: StreamGroup) -> bool {
        self.groups.contains(&group)
    }

    /// Streams the selection can emit
    pub fn streams(&self) -> Vec<StreamKind> {
        self.groups.iter().flat_map(|g| g.streams()).collect()
    }
}

/// Flat run configuration
#[derive(Clone, Default, Deserialize)]
pub struct RunConfig {
    /// Base URL all resource paths are appended to
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// Bearer token
    #[serde(default)]
    pub api_key: Option<String>,
    /// Country code stamped onto every record
    #[serde(default)]
    pub country_code: Option<String>,
    /// Page size limit (default 50)
    #[serde(default, deserialize_with = "lenient_usize")]
    pub page_size: Option<usize>,
    /// Pin fan-out to a single category
    #[serde(default)]
    pub skills_category: Option<String>,
    /// Stream groups to run (default all)
    #[serde(default, deserialize_with = "string_or_list")]
    pub stream_group: Option<Vec<String>>,
    /// Minimum spacing between requests in milliseconds (default 1000)
    #[serde(default)]
    pub rate_limit_interval_ms: Option<u64>,
    /// Per-request timeout in seconds (default 300)
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// Transport retry budget for 429/5xx/network failures (default 5)
    #[serde(default)]
    pub max_retries: Option<u32>,
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("country_code", &self.country_code)
            .field("page_size", &self.page_size)
            .field("skills_category", &self.skills_category)
            .field("stream_group", &self.stream_group)
            .field("rate_limit_interval_ms", &self.rate_limit_interval_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl RunConfig {
    /// Minimal configuration with the three required keys
    pub fn new(
        api_base_url: impl Into<String>,
        api_key: impl Into<String>,
        country_code: impl Into<String>,
    ) -> Self {
        Self {
            api_base_url: Some(api_base_url.into()),
            api_key: Some(api_key.into()),
            country_code: Some(country_code.into()),
            ..Default::default()
        }
    }

    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    /// Parse configuration from a JSON string
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Set the page size
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Pin fan-out to one category
    pub fn with_skills_category(mut self, category: impl Into<String>) -> Self {
        self.skills_category = Some(category.into());
        self
    }

    /// Select stream groups
    pub fn with_stream_group(mut self, group: impl Into<String>) -> Self {
        self.stream_group = Some(vec![group.into()]);
        self
    }

    /// Set the minimum request spacing
    pub fn with_rate_limit_interval_ms(mut self, interval_ms: u64) -> Self {
        self.rate_limit_interval_ms = Some(interval_ms);
        self
    }

    /// Check every key a run depends on
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api_base_url()?;
        self.api_key()?;
        self.country_code()?;
        if self.page_size() == 0 {
            return Err(ConfigError::InvalidValue {
                field: "page_size",
                message: "must be at least 1".to_string(),
            });
        }
        self.categories()?;
        self.stream_selection()?;
        Ok(())
    }

    /// Base URL without a trailing slash
    pub fn api_base_url(&self) -> Result<&str, ConfigError> {
        required(&self.api_base_url, "api_base_url").map(|url| url.trim_end_matches('/'))
    }

    /// Bearer token
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        required(&self.api_key, "api_key")
    }

    /// Country code stamped onto every record
    pub fn country_code(&self) -> Result<&str, ConfigError> {
        required(&self.country_code, "country_code")
    }

    /// Page size limit
    pub fn page_size(&self) -> usize {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Categories to fan out over, in order
    pub fn categories(&self) -> Result<Vec<SkillCategory>, ConfigError> {
        match self.skills_category.as_deref().map(str::trim) {
            None | Some("") => Ok(SkillCategory::ALL.to_vec()),
            Some(name) => SkillCategory::from_str(name)
                .map(|c| vec![c])
                .map_err(|message| ConfigError::InvalidValue {
                    field: "skills_category",
                    message,
                }),
        }
    }

    /// Stream groups selected for this run
    pub fn stream_selection(&self) -> Result<StreamSelection, ConfigError> {
        match &self.stream_group {
            None => Ok(StreamSelection::all()),
            Some(names) => StreamSelection::parse(names),
        }
    }

    /// Minimum spacing between consecutive requests
    pub fn rate_limit_interval(&self) -> Duration {
        Duration::from_millis(
            self.rate_limit_interval_ms
                .unwrap_or(DEFAULT_RATE_LIMIT_INTERVAL_MS),
        )
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Transport retry budget
    pub fn max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(MAX_RETRIES)
    }
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, ConfigError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::MissingField(field)),
    }
}

fn lenient_usize<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrString {
        Num(usize),
        Str(String),
    }

    match Option::<NumOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumOrString::Num(n)) => Ok(Some(n)),
        Some(NumOrString::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(NumOrString::Str(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("'{s}' is not a valid number"))),
    }
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => None,
        Some(OneOrMany::One(s)) => Some(vec![s]),
        Some(OneOrMany::Many(v)) => Some(v),
    })
}

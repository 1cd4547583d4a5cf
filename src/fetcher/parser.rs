//! Raw JSON → typed record conversion
//!
//! Upstream records are loosely typed: ids may arrive as strings or numbers,
//! optional fields may be missing or null. The parser normalises all of that
//! and stamps extractor-owned fields (country code, parent id) that the API
//! does not provide.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

use crate::fetcher::{FetcherError, FetcherResult};
use crate::{
    Industry, Occupation, OccupationDetail, OccupationTask, SkillCatalogEntry, SkillMention,
    SpecificSkill,
};

/// Identifier plus display fields shared by most upstream records
#[derive(Debug, Clone, PartialEq)]
pub struct NamedRecord {
    /// Record identifier
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Free-text description
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawNamed {
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawOccupationDetail {
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    category_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    stream: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    common_role_names: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    level: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    top_skills_mentions: Vec<RawMention>,
    #[serde(default, deserialize_with = "null_as_empty")]
    top_skills_specific: Vec<RawSpecific>,
    #[serde(default, deserialize_with = "null_as_empty")]
    top_tasks: Vec<RawTask>,
}

#[derive(Debug, Deserialize)]
struct RawMention {
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    mentions: Option<u64>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    skill_percentage: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct RawSpecific {
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    skill_percentage: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct RawTask {
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    time_percent: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_string")]
    description: Option<String>,
}

/// Parser for catalog API records
pub struct CatalogParser;

impl CatalogParser {
    /// Read an identifier field as a string; numbers are accepted, empty strings are not
    pub fn record_id(record: &Value, field: &str) -> Option<String> {
        match record.get(field)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Parse the id/name/description triple
    pub fn parse_named(raw: Value) -> FetcherResult<NamedRecord> {
        let parsed: RawNamed = serde_json::from_value(raw)
            .map_err(|e| FetcherError::ParseError(format!("Invalid record: {e}")))?;

        let id = parsed
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| FetcherError::ParseError("Missing or invalid id".to_string()))?;

        Ok(NamedRecord {
            id,
            name: parsed.name,
            description: parsed.description,
        })
    }

    /// Industry root record, stamped with the run's country code
    pub fn parse_industry(raw: Value, country_code: &str) -> FetcherResult<Industry> {
        let named = Self::parse_named(raw)?;
        Ok(Industry {
            id: named.id,
            name: named.name,
            country_code: country_code.to_string(),
        })
    }

    /// Occupation root record, stamped with the run's country code
    pub fn parse_occupation(raw: Value, country_code: &str) -> FetcherResult<Occupation> {
        let named = Self::parse_named(raw)?;
        Ok(Occupation {
            id: named.id,
            name: named.name,
            description: named.description,
            country_code: country_code.to_string(),
        })
    }

    /// Skills catalog entry
    pub fn parse_catalog_entry(raw: Value) -> FetcherResult<SkillCatalogEntry> {
        let named = Self::parse_named(raw)?;
        Ok(SkillCatalogEntry {
            id: named.id,
            name: named.name,
            description: named.description,
        })
    }

    /// Occupation detail; the parent's id fills in a missing `id`
    pub fn parse_occupation_detail(
        raw: Value,
        occupation_id: &str,
        country_code: &str,
    ) -> FetcherResult<OccupationDetail> {
        let parsed: RawOccupationDetail = serde_json::from_value(raw)
            .map_err(|e| FetcherError::ParseError(format!("Invalid occupation detail: {e}")))?;

        Ok(OccupationDetail {
            id: parsed
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| occupation_id.to_string()),
            name: parsed.name,
            description: parsed.description,
            category_name: parsed.category_name,
            stream: parsed.stream,
            common_role_names: parsed.common_role_names,
            level: parsed.level,
            top_skills_mentions: parsed
                .top_skills_mentions
                .into_iter()
                .map(|m| SkillMention {
                    id: m.id,
                    name: m.name,
                    description: m.description,
                    mentions: m.mentions,
                    skill_percentage: m.skill_percentage,
                })
                .collect(),
            top_skills_specific: parsed
                .top_skills_specific
                .into_iter()
                .map(|s| SpecificSkill {
                    id: s.id,
                    name: s.name,
                    description: s.description,
                    skill_percentage: s.skill_percentage,
                })
                .collect(),
            top_tasks: parsed
                .top_tasks
                .into_iter()
                .map(|t| OccupationTask {
                    id: t.id,
                    time_percent: t.time_percent,
                    description: t.description,
                })
                .collect(),
            country_code: country_code.to_string(),
        })
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Non-negative whole number; `12.0` and `"12"` are accepted, anything else is dropped
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64().or_else(|| n.as_f64().and_then(whole_count)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_count))
        }
        _ => None,
    })
}

fn whole_count(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64)
        .then_some(value as u64)
}

/// Decimal from a JSON number or numeric string; anything else is dropped
fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        _ => return Ok(None),
    };
    Ok(Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok())
}

/// List of display strings; non-text entries are stringified or dropped
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Vec<Value> = null_as_empty(deserializer)?;
    Ok(values
        .into_iter()
        .filter_map(|value| match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .collect())
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

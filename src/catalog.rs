//! Stream descriptors and JSON schemas
//!
//! Used by the `discover` command and by the line-delimited sink's `SCHEMA`
//! messages.

use serde::Serialize;
use serde_json::{json, Value};

use crate::config::StreamSelection;
use crate::StreamKind;

/// Description of one output stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamDescriptor {
    /// Stream name
    pub stream: &'static str,
    /// Primary key columns
    pub key_properties: &'static [&'static str],
    /// JSON schema of the stream's records
    pub schema: Value,
}

impl StreamDescriptor {
    /// Descriptor of one stream
    pub fn for_stream(stream: StreamKind) -> Self {
        Self {
            stream: stream.name(),
            key_properties: stream.key_properties(),
            schema: schema(stream),
        }
    }
}

/// Descriptors of every stream the selection can emit, in catalog order
pub fn catalog(selection: &StreamSelection) -> Vec<StreamDescriptor> {
    let selected = selection.streams();
    StreamKind::ALL
        .into_iter()
        .filter(|kind| selected.contains(kind))
        .map(StreamDescriptor::for_stream)
        .collect()
}

/// JSON schema of a stream's records
pub fn schema(stream: StreamKind) -> Value {
    let properties = match stream {
        StreamKind::Industries => json!({
            "id": string(),
            "name": nullable_string(),
            "country_code": string(),
        }),
        StreamKind::Occupations => json!({
            "id": string(),
            "name": nullable_string(),
            "description": nullable_string(),
            "country_code": string(),
        }),
        StreamKind::IndustrySkills | StreamKind::OccupationSkills => json!({
            "id": string(),
            "name": nullable_string(),
            "description": nullable_string(),
            "rank": {"type": "integer", "minimum": 1},
            "category": {"type": "string", "enum": ["emerging", "trending", "declining"]},
            "parent_id": string(),
            "country_code": string(),
        }),
        StreamKind::SkillsList => json!({
            "id": string(),
            "name": nullable_string(),
            "description": nullable_string(),
        }),
        StreamKind::OccupationDetails => json!({
            "id": string(),
            "name": nullable_string(),
            "description": nullable_string(),
            "category_name": nullable_string(),
            "stream": nullable_string(),
            "common_role_names": {"type": "array", "items": string()},
            "level": nullable_string(),
            "top_skills_mentions": array_of(json!({
                "id": nullable_string(),
                "name": nullable_string(),
                "description": nullable_string(),
                "mentions": {"type": ["integer", "null"]},
                "skill_percentage": nullable_number(),
            })),
            "top_skills_specific": array_of(json!({
                "id": nullable_string(),
                "name": nullable_string(),
                "description": nullable_string(),
                "skill_percentage": nullable_number(),
            })),
            "top_tasks": array_of(json!({
                "id": nullable_string(),
                "time_percent": nullable_number(),
                "description": nullable_string(),
            })),
            "country_code": string(),
        }),
    };

    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": properties,
    })
}

fn string() -> Value {
    json!({"type": "string"})
}

fn nullable_string() -> Value {
    json!({"type": ["string", "null"]})
}

fn nullable_number() -> Value {
    json!({"type": ["number", "null"]})
}

fn array_of(properties: Value) -> Value {
    json!({
        "type": "array",
        "items": {"type": "object", "properties": properties},
    })
}

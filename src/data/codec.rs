use serde::{Deserialize, Serialize};

/// A single decoded measurement, alive only between decode and aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Submission {
    #[serde(rename = "action")]
    pub name: String,
    /// Caller-defined unit and sign; no range checks beyond i64.
    #[serde(rename = "time")]
    pub value: i64,
}

impl Submission {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// One row of a report: the current running average for an action name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateEntry {
    #[serde(rename = "action")]
    pub name: String,
    #[serde(rename = "avg")]
    pub average: i64,
}

impl AggregateEntry {
    pub fn new(name: impl Into<String>, average: i64) -> Self {
        Self {
            name: name.into(),
            average,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Invalid submission: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode a raw `{"action": ..., "time": ...}` submission.
///
/// Both fields are required; `time` must be an integer that fits in an i64.
pub fn decode(raw: &str) -> Result<Submission, DecodeError> {
    Ok(serde_json::from_str(raw)?)
}

/// Encode entries as a tab-indented JSON array, preserving the given order.
pub fn encode(entries: &[AggregateEntry]) -> Result<String, serde_json::Error> {
    let mut buf = Vec::with_capacity(entries.len() * 48 + 2);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    entries.serialize(&mut ser)?;

    // serde_json only ever writes valid UTF-8
    String::from_utf8(buf).map_err(<serde_json::Error as serde::ser::Error>::custom)
}

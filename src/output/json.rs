//! JSON output formatting

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wrapper for JSON output with metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T> {
    /// The actual data
    pub data: T,

    /// Metadata about the response
    pub meta: Metadata,
}

/// Metadata included in JSON output
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// When the output was produced
    pub generated_at: String,

    /// CLI version
    pub version: String,

    /// Record kind (`audit`, `projects`, `disable_sast`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Group the records belong to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,

    /// Counts derived from the records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Value>,
}

impl Metadata {
    fn now() -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ..Self::default()
        }
    }
}

impl<T> JsonOutput<T> {
    /// Create a new JSON output with metadata
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: Metadata::now(),
        }
    }

    /// Create a JSON output with explicit metadata
    pub fn with_meta(data: T, meta: Metadata) -> Self {
        Self { data, meta }
    }
}

/// Format data as pretty-printed JSON
pub fn format_json<T: Serialize + ?Sized>(data: &T) -> Result<String, serde_json::Error> {
    let output = JsonOutput::new(data);
    serde_json::to_string_pretty(&output)
}

/// Format data as pretty-printed JSON with a summary in the metadata
pub fn format_json_with_summary<T: Serialize + ?Sized, S: Serialize>(
    data: &T,
    summary: &S,
) -> Result<String, serde_json::Error> {
    let mut output = JsonOutput::new(data);
    output.meta.summary = Some(serde_json::to_value(summary)?);
    serde_json::to_string_pretty(&output)
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::model::{Project, Tag};

/// File header as read from the first 256 bytes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub signature: String,
    pub version: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Header {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp_ms)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
    }
}

/// Everything a decode produces.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AcdDocument {
    pub header: Header,
    pub project: Project,
    /// The tag section exactly as stored, before attribution. Local tags that
    /// matched no program appear only here.
    pub flat_tags: Vec<Tag>,
}

use serde_json::{Map, Value};

/// Encoder settings for the ACD header.
/// Decoding needs no configuration; the file describes itself.
#[derive(Debug, Clone, PartialEq)]
pub struct AcdConfig {
    /// Header timestamp in Unix milliseconds. `None` stamps the current time.
    pub timestamp_ms: Option<u64>,
    /// Extra header metadata entries.
    pub metadata: Map<String, Value>,
    /// Add a `lastModified` RFC 3339 entry derived from the timestamp.
    pub stamp_last_modified: bool,
}

impl Default for AcdConfig {
    fn default() -> Self {
        Self {
            timestamp_ms: None,
            metadata: Map::new(),
            stamp_last_modified: true,
        }
    }
}

impl AcdConfig {
    /// Byte-stable output: fixed timestamp and no `lastModified` entry.
    pub fn reproducible(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms: Some(timestamp_ms),
            metadata: Map::new(),
            stamp_last_modified: false,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

use std::sync::Arc;

use crate::domain::{AcdDocument, Project};
use crate::error::Result;
use crate::ports::{DiagnosticSink, LogSink, ProjectCodec};

use super::config::AcdConfig;
use super::project::{read_document, write_project};

/// RSLogix 5000 ACD codec: converts between the project model and file bytes.
#[derive(Clone)]
pub struct AcdCodec {
    config: AcdConfig,
    sink: Arc<dyn DiagnosticSink>,
}

impl AcdCodec {
    /// Codec with the given encoder settings, reporting through `log`.
    pub fn new(config: AcdConfig) -> Self {
        Self {
            config,
            sink: Arc::new(LogSink),
        }
    }

    /// Route diagnostics to `sink` instead of the `log` facade.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &AcdConfig {
        &self.config
    }
}

impl Default for AcdCodec {
    fn default() -> Self {
        Self::new(AcdConfig::default())
    }
}

impl std::fmt::Debug for AcdCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcdCodec")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ProjectCodec for AcdCodec {
    fn decode_document(&self, data: &[u8]) -> Result<AcdDocument> {
        read_document(data, self.sink.as_ref())
    }

    fn encode(&self, project: &Project) -> Result<Vec<u8>> {
        write_project(project, &self.config, self.sink.as_ref())
    }

    fn format_name(&self) -> &'static str {
        "RSLogix 5000 ACD"
    }
}

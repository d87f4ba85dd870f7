use log::warn;

use crate::domain::{validate_project, AcdDocument, Project, ValidationIssue};
use crate::error::Result;
use crate::ports::ProjectCodec;

/// Application layer use case wrapper around `ProjectCodec`.
/// Validation lives here so the codec stays a pure byte transform.
#[derive(Debug, Clone)]
pub struct ProjectService<C: ProjectCodec> {
    codec: C,
}

impl<C: ProjectCodec> ProjectService<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    /// Decode file bytes into the project tree.
    pub fn decode(&self, data: &[u8]) -> Result<Project> {
        self.codec.decode(data)
    }

    /// Decode file bytes, keeping the header and the flat tag list.
    pub fn decode_document(&self, data: &[u8]) -> Result<AcdDocument> {
        self.codec.decode_document(data)
    }

    /// Encode a project. Validation issues are logged, not fatal; parts of the
    /// project they describe may not come back from a decode.
    pub fn encode(&self, project: &Project) -> Result<Vec<u8>> {
        for issue in validate_project(project) {
            warn!("{issue}");
        }
        self.codec.encode(project)
    }

    pub fn check(&self, project: &Project) -> Vec<ValidationIssue> {
        validate_project(project)
    }

    pub fn format_name(&self) -> &'static str {
        self.codec.format_name()
    }
}

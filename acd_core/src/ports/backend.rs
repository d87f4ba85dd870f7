use crate::domain::{AcdDocument, Project};
use crate::error::Result;

/// Project file codec port.
/// The crate only converts bytes <-> model; file pickers and editors live above it.
pub trait ProjectCodec {
    /// Decode raw file bytes with header and flat tag list. Only a bad header is fatal.
    fn decode_document(&self, data: &[u8]) -> Result<AcdDocument>;
    /// Decode raw file bytes into the project tree.
    fn decode(&self, data: &[u8]) -> Result<Project> {
        self.decode_document(data).map(|doc| doc.project)
    }
    /// Encode a project into a complete file image.
    fn encode(&self, project: &Project) -> Result<Vec<u8>>;
    /// Human-readable name of the file format.
    fn format_name(&self) -> &'static str;
}

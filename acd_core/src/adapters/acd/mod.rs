mod attribution;
mod backend;
mod config;
mod container;
mod layout;
mod project;
mod protocol;
mod wire;

pub mod records;

pub use attribution::{attach_ladder_logic, attribute_tags};
pub use backend::AcdCodec;
pub use config::AcdConfig;
pub use container::{AcdReader, Section, Sections};
pub use project::{read_document, write_project};
pub use protocol::{SectionType, HEADER_LEN, SIGNATURE, SIGNATURE_PREFIX};

//! Core ACD project file codec.
//! Responsibilities: decode/encode RSLogix 5000 ACD bytes to/from the project model.
//! Non-goals: file dialogs, editors, PLC communication (handled by upper layers).

pub mod adapters;
pub mod application;
pub mod domain;
pub mod error;
pub mod ports;

pub use adapters::acd::{AcdCodec, AcdConfig, AcdReader};
pub use application::service::ProjectService;
pub use domain::{AcdDocument, Header, Project};
pub use error::{AcdError, EncodingFault, Result};
pub use ports::{Diagnostic, DiagnosticLog, DiagnosticSink, ProjectCodec};

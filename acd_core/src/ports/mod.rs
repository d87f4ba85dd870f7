pub mod backend;
pub mod diagnostics;

pub use backend::ProjectCodec;
pub use diagnostics::{
    Diagnostic, DiagnosticLog, DiagnosticSink, LogSink, NullSink, ParseFault, RecordKind,
};

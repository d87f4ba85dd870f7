//! Structured reporting for degraded reads and writes.
//!
//! Codecs never fail on damaged record data; they stop, keep what they have,
//! and report here. Callers pick the sink: `LogSink` for the `log` facade,
//! `DiagnosticLog` to inspect the reports afterwards.

use std::fmt;

use log::{debug, warn};
use parking_lot::Mutex;
use thiserror::Error;

/// Record stream a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Program,
    Tag,
    LadderBlock,
    Rung,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::Program => "program",
            RecordKind::Tag => "tag",
            RecordKind::LadderBlock => "ladder-logic block",
            RecordKind::Rung => "rung",
        };
        f.write_str(name)
    }
}

/// Why a record could not be decoded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseFault {
    #[error("need {needed} bytes at offset {offset}, only {available} left")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("{field} = {value} is outside the accepted range")]
    FieldOutOfRange { field: &'static str, value: u64 },

    #[error("string of {len} bytes exceeds limit of {max}")]
    StringTooLong { len: usize, max: usize },

    #[error("next offset {next} does not move past {floor}")]
    OffsetRegression { next: usize, floor: usize },

    #[error("next offset {next} points back inside its own record, which ends at {end}")]
    OffsetInsideRecord { next: usize, end: usize },

    #[error("next offset {next} is beyond the end of the data ({len} bytes)")]
    OffsetOutOfBounds { next: usize, len: usize },

    #[error("malformed record: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Header metadata text was not a JSON object; an empty map was used.
    MetadataParseFailed { reason: String },
    /// Metadata did not fit in the header and was written as `{}`.
    MetadataDropped { len: usize, capacity: usize },
    /// A section frame declared a payload running past the buffer end.
    SectionOutOfBounds {
        section_type: u8,
        offset: usize,
        length: usize,
        available: usize,
    },
    /// Decoding of a record stream stopped at `offset`.
    RecordRejected {
        kind: RecordKind,
        offset: usize,
        fault: ParseFault,
    },
    /// One element skipped because its code is not in the instruction table.
    UnknownInstruction { code: u16, offset: usize },
    /// Remaining elements of a rung were abandoned; decoding resumed at the next rung.
    RungElementsAborted {
        rung: u16,
        parsed: usize,
        declared: usize,
        fault: ParseFault,
    },
    /// A local tag whose name prefix matches no program.
    TagUnattributed { tag: String },
    /// A ladder-logic block naming a program/routine that does not exist.
    LadderLogicUnresolved { program: String, routine: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MetadataParseFailed { reason } => {
                write!(f, "Failed to parse metadata: {reason}")
            }
            Diagnostic::MetadataDropped { len, capacity } => write!(
                f,
                "metadata of {len} bytes does not fit header capacity of {capacity}; written empty"
            ),
            Diagnostic::SectionOutOfBounds {
                section_type,
                offset,
                length,
                available,
            } => write!(
                f,
                "section 0x{section_type:02X} at {offset} declares {length} bytes, only {available} available"
            ),
            Diagnostic::RecordRejected { kind, offset, fault } => {
                write!(f, "{kind} record at offset {offset} rejected: {fault}")
            }
            Diagnostic::UnknownInstruction { code, offset } => {
                write!(f, "Unknown element type: 0x{code:02X} at offset {offset}")
            }
            Diagnostic::RungElementsAborted {
                rung,
                parsed,
                declared,
                fault,
            } => write!(
                f,
                "rung {rung}: stopped after {parsed} of {declared} elements: {fault}"
            ),
            Diagnostic::TagUnattributed { tag } => {
                write!(f, "local tag '{tag}' matches no program")
            }
            Diagnostic::LadderLogicUnresolved { program, routine } => {
                write!(f, "ladder logic for unknown routine {program}/{routine} discarded")
            }
        }
    }
}

impl Diagnostic {
    /// Expected-in-normal-use reports; logged at debug instead of warn.
    pub fn is_informational(&self) -> bool {
        matches!(self, Diagnostic::TagUnattributed { .. })
    }
}

pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, diagnostic: Diagnostic) {
        if diagnostic.is_informational() {
            debug!("{diagnostic}");
        } else {
            warn!("{diagnostic}");
        }
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _: Diagnostic) {}
}

/// Keeps every report in memory.
#[derive(Debug, Default)]
pub struct DiagnosticLog {
    entries: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn contains(&self, predicate: impl Fn(&Diagnostic) -> bool) -> bool {
        self.entries.lock().iter().any(predicate)
    }
}

impl DiagnosticSink for DiagnosticLog {
    fn report(&self, diagnostic: Diagnostic) {
        self.entries.lock().push(diagnostic);
    }
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for std::sync::Arc<T> {
    fn report(&self, diagnostic: Diagnostic) {
        (**self).report(diagnostic)
    }
}

use thiserror::Error;

/// Hard failures surfaced to callers. Everything else degrades to shorter
/// lists plus a [`Diagnostic`](crate::ports::Diagnostic).
#[derive(Debug, Error)]
pub enum AcdError {
    /// Header is missing or does not carry the expected signature.
    #[error("Failed to read ACD header: {0}")]
    Format(String),

    /// An explicit range request fell outside the buffer.
    #[error(
        "Failed to read section at offset {offset}: range of {length} bytes exceeds buffer of {available} bytes"
    )]
    Bounds {
        offset: usize,
        length: usize,
        available: usize,
    },

    #[error("Failed to encode project: {0}")]
    Encoding(#[from] EncodingFault),

    #[error("I/O error while writing: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingFault {
    #[error("invalid element type '{code}' in {program}/{routine} rung {rung}")]
    UnknownInstruction {
        code: String,
        program: String,
        routine: String,
        rung: u16,
    },

    #[error("{field} value {value} does not fit in {bits} bits")]
    FieldOverflow {
        field: &'static str,
        value: usize,
        bits: u32,
    },
}

pub type Result<T> = std::result::Result<T, AcdError>;

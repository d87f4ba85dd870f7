/*
ACD container layout (little endian throughout)

  0..8     signature, must start with "RSLogix"
  8..12    version, 4 ASCII bytes
  12..20   timestamp, u64 milliseconds
  20..256  metadata, NUL-terminated JSON object
  256..    sections: [type u8][len u32][payload; len]
*/

use std::fmt;

/// Signature written by the encoder.
pub const SIGNATURE: &[u8; 8] = b"RSLogix5";
/// Prefix a file must start with to be accepted.
pub const SIGNATURE_PREFIX: &[u8; 7] = b"RSLogix";

pub const HEADER_LEN: usize = 256;
pub const VERSION_LEN: usize = 4;
pub const METADATA_OFFSET: usize = 20;
/// Metadata bytes available in the header, terminator included.
pub const METADATA_CAPACITY: usize = HEADER_LEN - METADATA_OFFSET;

/// Section frame: type byte + u32 payload length.
pub const SECTION_FRAME_LEN: usize = 5;

/// Fixed record header sizes.
pub const PROGRAM_HEADER_LEN: usize = 8;
pub const TAG_HEADER_LEN: usize = 10;
pub const RUNG_HEADER_LEN: usize = 12;
pub const ELEMENT_HEADER_LEN: usize = 10;
/// u16 length prefix of every string.
pub const STRING_PREFIX_LEN: usize = 2;

// Reader guards
pub const MAX_PROGRAM_NAME_LEN: u16 = 256;
pub const MAX_ROUTINE_COUNT: u16 = 1000;
pub const MAX_ROUTINE_NAME_LEN: usize = 256;
pub const MAX_TAG_NAME_LEN: u16 = 256;
pub const MAX_TAG_TYPE_LEN: u16 = 64;
pub const MAX_RUNG_ELEMENTS: u16 = 100;
pub const MAX_RUNG_COMMENT_LEN: u16 = 1000;
pub const MAX_PARAMETER_LEN: usize = 256;
pub const MAX_BLOCK_NAME_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SectionType {
    Programs = 0x02,
    Tags = 0x03,
    LadderLogic = 0x04,
}

impl SectionType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x02 => Some(SectionType::Programs),
            0x03 => Some(SectionType::Tags),
            0x04 => Some(SectionType::LadderLogic),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SectionType::Programs => "Programs",
            SectionType::Tags => "Tags",
            SectionType::LadderLogic => "LadderLogic",
        };
        f.write_str(name)
    }
}

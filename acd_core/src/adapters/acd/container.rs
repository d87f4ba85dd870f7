use std::io::{Cursor, Write};

use binrw::{binread, BinRead};
use byteorder::{ByteOrder, LittleEndian};
use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use serde_json::{Map, Value};

use crate::domain::Header;
use crate::error::{AcdError, Result};
use crate::ports::{Diagnostic, DiagnosticSink, LogSink};

use super::config::AcdConfig;
use super::protocol::{
    SectionType, HEADER_LEN, METADATA_CAPACITY, SECTION_FRAME_LEN, SIGNATURE, SIGNATURE_PREFIX,
    VERSION_LEN,
};
use super::wire::{decode_utf8, to_u32, AcdWriter};

/// The fixed 256-byte header.
#[binread]
#[br(little)]
struct RawHeader {
    signature: [u8; 8],
    version: [u8; VERSION_LEN],
    timestamp_ms: u64,
    #[br(count = METADATA_CAPACITY)]
    metadata: Vec<u8>,
}

/// A type-tagged byte range found after the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<'a> {
    pub type_code: u8,
    /// Absolute offset of the payload.
    pub offset: usize,
    pub data: &'a [u8],
}

impl<'a> Section<'a> {
    pub fn section_type(&self) -> Option<SectionType> {
        SectionType::from_u8(self.type_code)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Read side of the container: header and section lookup over a flat buffer.
pub struct AcdReader<'a> {
    data: &'a [u8],
    sink: &'a dyn DiagnosticSink,
}

impl<'a> AcdReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_sink(data, &LogSink)
    }

    pub fn with_sink(data: &'a [u8], sink: &'a dyn DiagnosticSink) -> Self {
        Self { data, sink }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn read_header(&self) -> Result<Header> {
        if self.data.len() < HEADER_LEN {
            return Err(AcdError::Format(format!(
                "file is {} bytes, shorter than the {HEADER_LEN}-byte header",
                self.data.len()
            )));
        }
        let raw = RawHeader::read(&mut Cursor::new(&self.data[..HEADER_LEN]))
            .map_err(|e| AcdError::Format(e.to_string()))?;
        if !raw.signature.starts_with(SIGNATURE_PREFIX) {
            return Err(AcdError::Format("Invalid ACD file signature".to_string()));
        }

        let header = Header {
            signature: trim_nul(decode_utf8(&raw.signature)),
            version: trim_nul(decode_utf8(&raw.version)),
            timestamp_ms: raw.timestamp_ms,
            metadata: self.parse_metadata(&raw.metadata),
        };
        debug!(
            "ACD header: signature={} version={} timestamp={}",
            header.signature, header.version, header.timestamp_ms
        );
        Ok(header)
    }

    fn parse_metadata(&self, blob: &[u8]) -> Map<String, Value> {
        let end = blob.iter().position(|b| *b == 0).unwrap_or(blob.len());
        let text = decode_utf8(&blob[..end]);
        if text.trim().is_empty() {
            return Map::new();
        }
        match serde_json::from_str::<Map<String, Value>>(&text) {
            Ok(map) => map,
            Err(e) => {
                self.sink.report(Diagnostic::MetadataParseFailed {
                    reason: e.to_string(),
                });
                Map::new()
            }
        }
    }

    /// Every well-formed section frame after the header, in file order.
    pub fn sections(&self) -> Sections<'a> {
        Sections {
            data: self.data,
            offset: HEADER_LEN,
            sink: self.sink,
            done: false,
        }
    }

    /// First section of the given type, if any.
    pub fn find_section(&self, section_type: SectionType) -> Option<Section<'a>> {
        self.sections()
            .find(|section| section.type_code == section_type.as_u8())
    }

    pub fn read_section(&self, offset: usize, length: usize) -> Result<&'a [u8]> {
        match offset.checked_add(length) {
            Some(end) if end <= self.data.len() => Ok(&self.data[offset..end]),
            _ => Err(AcdError::Bounds {
                offset,
                length,
                available: self.data.len(),
            }),
        }
    }
}

pub struct Sections<'a> {
    data: &'a [u8],
    offset: usize,
    sink: &'a dyn DiagnosticSink,
    done: bool,
}

impl<'a> Iterator for Sections<'a> {
    type Item = Section<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let frame_end = self.offset.saturating_add(SECTION_FRAME_LEN);
        if frame_end > self.data.len() {
            self.done = true;
            return None;
        }

        let type_code = self.data[self.offset];
        let length = LittleEndian::read_u32(&self.data[self.offset + 1..frame_end]) as usize;
        match frame_end.checked_add(length) {
            Some(end) if end <= self.data.len() => {
                let section = Section {
                    type_code,
                    offset: frame_end,
                    data: &self.data[frame_end..end],
                };
                self.offset = end;
                Some(section)
            }
            _ => {
                self.sink.report(Diagnostic::SectionOutOfBounds {
                    section_type: type_code,
                    offset: self.offset,
                    length,
                    available: self.data.len() - frame_end,
                });
                self.done = true;
                None
            }
        }
    }
}

fn trim_nul(text: String) -> String {
    text.trim_end_matches('\0').to_string()
}

/// Header metadata blob (JSON text, no terminator) for an encode.
pub(crate) fn metadata_blob(
    config: &AcdConfig,
    timestamp_ms: u64,
    sink: &dyn DiagnosticSink,
) -> Vec<u8> {
    let mut map = config.metadata.clone();
    if config.stamp_last_modified {
        let stamp = i64::try_from(timestamp_ms)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis);
        if let Some(stamp) = stamp {
            map.insert(
                "lastModified".to_string(),
                Value::String(stamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
        }
    }

    let text = serde_json::to_string(&map).unwrap_or_else(|_| "{}".to_string());
    // One byte is reserved for the terminator.
    if text.len() >= METADATA_CAPACITY {
        sink.report(Diagnostic::MetadataDropped {
            len: text.len(),
            capacity: METADATA_CAPACITY - 1,
        });
        return b"{}".to_vec();
    }
    text.into_bytes()
}

/// Write the fixed 256-byte header.
pub(crate) fn write_header<W: Write>(
    w: &mut AcdWriter<W>,
    version: &str,
    timestamp_ms: u64,
    metadata: &[u8],
) -> Result<()> {
    let start = w.offset();
    w.write_bytes(SIGNATURE)?;

    // Version is a fixed 4-byte field: truncated or zero-padded.
    let mut version_field = [0u8; VERSION_LEN];
    let version_bytes = version.as_bytes();
    let n = version_bytes.len().min(VERSION_LEN);
    version_field[..n].copy_from_slice(&version_bytes[..n]);
    w.write_bytes(&version_field)?;

    w.write_u64(timestamp_ms)?;
    w.write_bytes(metadata)?;

    let used = w.offset() - start;
    w.write_zeros(HEADER_LEN.saturating_sub(used))?;
    Ok(())
}

/// Write a section frame: type byte + payload length.
pub(crate) fn write_section_frame<W: Write>(
    w: &mut AcdWriter<W>,
    section_type: SectionType,
    payload_len: usize,
) -> Result<()> {
    w.write_u8(section_type.as_u8())?;
    w.write_u32(to_u32("section length", payload_len)?)?;
    Ok(())
}

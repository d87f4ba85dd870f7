use std::io::{Cursor, Write};

use binrw::{BinRead, Endian};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use encoding_rs::UTF_8;

use crate::error::{EncodingFault, Result};
use crate::ports::ParseFault;

use super::protocol::STRING_PREFIX_LEN;

/// Fixed-size record header with a known byte length.
pub(crate) trait FixedRecord {
    const LEN: usize;
}

/// Bounds-checked little-endian reader over a borrowed payload.
/// Every failure is a `ParseFault`; callers decide whether it stops the stream.
pub(crate) struct ByteReader<'a> {
    inner: Cursor<&'a [u8]>,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            inner: Cursor::new(data),
        }
    }

    pub fn position(&self) -> usize {
        self.inner.position() as usize
    }

    pub fn len(&self) -> usize {
        self.inner.get_ref().len()
    }

    pub fn remaining_len(&self) -> usize {
        self.len().saturating_sub(self.position())
    }

    pub fn is_at_end(&self) -> bool {
        self.remaining_len() == 0
    }

    pub fn seek_to(&mut self, pos: usize) -> std::result::Result<(), ParseFault> {
        if pos > self.len() {
            return Err(ParseFault::OffsetOutOfBounds {
                next: pos,
                len: self.len(),
            });
        }
        self.inner.set_position(pos as u64);
        Ok(())
    }

    fn require(&self, needed: usize) -> std::result::Result<(), ParseFault> {
        if self.remaining_len() < needed {
            return Err(ParseFault::Truncated {
                offset: self.position(),
                needed,
                available: self.remaining_len(),
            });
        }
        Ok(())
    }

    pub fn read_u16(&mut self) -> std::result::Result<u16, ParseFault> {
        self.require(2)?;
        self.inner
            .read_u16::<LittleEndian>()
            .map_err(|e| ParseFault::Malformed(e.to_string()))
    }

    pub fn read_u32(&mut self) -> std::result::Result<u32, ParseFault> {
        self.require(4)?;
        self.inner
            .read_u32::<LittleEndian>()
            .map_err(|e| ParseFault::Malformed(e.to_string()))
    }

    /// Read a fixed record header declared with `#[binread]`.
    pub fn read_fixed<T>(&mut self) -> std::result::Result<T, ParseFault>
    where
        T: FixedRecord + for<'b> BinRead<Args<'b> = ()>,
    {
        self.require(T::LEN)?;
        T::read_options(&mut self.inner, Endian::Little, ())
            .map_err(|e| ParseFault::Malformed(e.to_string()))
    }

    pub fn read_slice(&mut self, len: usize) -> std::result::Result<&'a [u8], ParseFault> {
        self.require(len)?;
        let start = self.position();
        let data: &'a [u8] = *self.inner.get_ref();
        self.inner.set_position((start + len) as u64);
        Ok(&data[start..start + len])
    }

    /// u16 byte length + UTF-8 bytes. `max_len` bounds the declared length.
    pub fn read_string(&mut self, max_len: usize) -> std::result::Result<String, ParseFault> {
        let len = self.read_u16()? as usize;
        if len > max_len {
            return Err(ParseFault::StringTooLong { len, max: max_len });
        }
        let bytes = self.read_slice(len)?;
        Ok(decode_utf8(bytes))
    }
}

pub(crate) fn decode_utf8(bytes: &[u8]) -> String {
    let (text, _) = UTF_8.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Encoded size of a length-prefixed string.
pub(crate) fn string_size(value: &str) -> usize {
    STRING_PREFIX_LEN + value.len()
}

pub(crate) fn to_u16(field: &'static str, value: usize) -> std::result::Result<u16, EncodingFault> {
    u16::try_from(value).map_err(|_| EncodingFault::FieldOverflow {
        field,
        value,
        bits: 16,
    })
}

pub(crate) fn to_u32(field: &'static str, value: usize) -> std::result::Result<u32, EncodingFault> {
    u32::try_from(value).map_err(|_| EncodingFault::FieldOverflow {
        field,
        value,
        bits: 32,
    })
}

/// Forward-progress guard for offset-chained records.
///
/// Checked twice per record. From the header alone, `next` must lie past
/// both the record start and everything consumed before it, and within the
/// payload. Once the body is read, `next` may not point back inside it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OffsetChain {
    floor: usize,
    len: usize,
}

impl OffsetChain {
    pub fn new(len: usize) -> Self {
        Self { floor: 0, len }
    }

    pub fn admit(&self, start: usize, next: usize) -> std::result::Result<(), ParseFault> {
        let floor = self.floor.max(start);
        if next <= floor {
            return Err(ParseFault::OffsetRegression { next, floor });
        }
        if next > self.len {
            return Err(ParseFault::OffsetOutOfBounds { next, len: self.len });
        }
        Ok(())
    }

    /// Close a record whose bytes were consumed up to `consumed_end`.
    pub fn settle(
        &mut self,
        consumed_end: usize,
        next: usize,
    ) -> std::result::Result<(), ParseFault> {
        if next < consumed_end {
            return Err(ParseFault::OffsetInsideRecord {
                next,
                end: consumed_end,
            });
        }
        self.floor = self.floor.max(consumed_end);
        Ok(())
    }
}

/// Little-endian writer that tracks how many bytes it has emitted.
pub(crate) struct AcdWriter<W: Write> {
    inner: W,
    offset: usize,
}

impl<W: Write> AcdWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, offset: 0 }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        self.inner.write_u8(v)?;
        self.offset += 1;
        Ok(())
    }

    pub fn write_u16(&mut self, v: u16) -> Result<()> {
        self.inner.write_u16::<LittleEndian>(v)?;
        self.offset += 2;
        Ok(())
    }

    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        self.inner.write_u32::<LittleEndian>(v)?;
        self.offset += 4;
        Ok(())
    }

    pub fn write_u64(&mut self, v: u64) -> Result<()> {
        self.inner.write_u64::<LittleEndian>(v)?;
        self.offset += 8;
        Ok(())
    }

    pub fn write_bytes(&mut self, v: &[u8]) -> Result<()> {
        self.inner.write_all(v)?;
        self.offset += v.len();
        Ok(())
    }

    pub fn write_zeros(&mut self, count: usize) -> Result<()> {
        for _ in 0..count {
            self.write_u8(0)?;
        }
        Ok(())
    }

    /// u16 byte length + UTF-8 bytes.
    pub fn write_string(&mut self, v: &str) -> Result<()> {
        self.write_u16(to_u16("string length", v.len())?)?;
        self.write_bytes(v.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_reader_honours_declared_limit() {
        let mut data = vec![5, 0];
        data.extend_from_slice(b"Hello");
        let mut reader = ByteReader::new(&data);
        assert_eq!(
            reader.read_string(4),
            Err(ParseFault::StringTooLong { len: 5, max: 4 })
        );

        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_string(5).unwrap(), "Hello");
        assert!(reader.is_at_end());
    }

    #[test]
    fn string_reader_rejects_length_past_end() {
        let data = [9u8, 0, b'a', b'b'];
        let mut reader = ByteReader::new(&data);
        assert!(matches!(
            reader.read_string(256),
            Err(ParseFault::Truncated { needed: 9, available: 2, .. })
        ));
    }

    #[test]
    fn string_length_counts_utf8_bytes() {
        let mut w = AcdWriter::new(Vec::new());
        w.write_string("Motör").unwrap();
        let bytes = w.into_inner();
        assert_eq!(&bytes[..2], &[6, 0]);
        assert_eq!(string_size("Motör"), 8);

        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.read_string(6).unwrap(), "Motör");
    }

    #[test]
    fn offset_chain_requires_forward_progress() {
        let mut chain = OffsetChain::new(100);
        assert!(chain.admit(0, 20).is_ok());
        assert_eq!(
            chain.admit(0, 0),
            Err(ParseFault::OffsetRegression { next: 0, floor: 0 })
        );
        chain.settle(20, 20).unwrap();
        // A record pointing back into already-consumed bytes is refused.
        assert_eq!(
            chain.admit(10, 15),
            Err(ParseFault::OffsetRegression { next: 15, floor: 20 })
        );
        assert_eq!(
            chain.admit(20, 101),
            Err(ParseFault::OffsetOutOfBounds { next: 101, len: 100 })
        );
        assert!(chain.admit(20, 100).is_ok());
    }

    #[test]
    fn offset_chain_refuses_next_inside_consumed_body() {
        let mut chain = OffsetChain::new(100);
        // The header alone passes; the body then runs to 30.
        assert!(chain.admit(0, 12).is_ok());
        assert_eq!(
            chain.settle(30, 12),
            Err(ParseFault::OffsetInsideRecord { next: 12, end: 30 })
        );
        assert!(chain.settle(30, 30).is_ok());
    }

    #[test]
    fn oversized_string_is_an_encoding_fault() {
        let mut w = AcdWriter::new(Vec::new());
        let long = "x".repeat(u16::MAX as usize + 1);
        let err = w.write_string(&long).unwrap_err();
        assert!(matches!(
            err,
            crate::error::AcdError::Encoding(EncodingFault::FieldOverflow { bits: 16, .. })
        ));
    }
}

//! Tags section: one flat, offset-chained list of every tag in the project.
//!
//! ```text
//! [name_len u16][type_len u16][scope u16][next u32][name][type]
//! ```

use std::collections::HashSet;
use std::io::Write;

use binrw::binread;

use crate::domain::{Project, Tag, TagScope};
use crate::error::Result;
use crate::ports::{Diagnostic, DiagnosticSink, ParseFault, RecordKind};

use super::super::layout::RecordLayout;
use super::super::protocol::{MAX_TAG_NAME_LEN, MAX_TAG_TYPE_LEN, TAG_HEADER_LEN};
use super::super::wire::{
    string_size, to_u16, to_u32, AcdWriter, ByteReader, FixedRecord, OffsetChain,
};

#[binread]
#[br(little)]
#[derive(Debug, Clone, Copy)]
struct TagHeader {
    name_len: u16,
    type_len: u16,
    scope: u16,
    next_offset: u32,
}

impl FixedRecord for TagHeader {
    const LEN: usize = TAG_HEADER_LEN;
}

impl TagHeader {
    fn check(&self) -> std::result::Result<(), ParseFault> {
        if !(1..=MAX_TAG_NAME_LEN).contains(&self.name_len) {
            return Err(ParseFault::FieldOutOfRange {
                field: "tag name length",
                value: u64::from(self.name_len),
            });
        }
        if !(1..=MAX_TAG_TYPE_LEN).contains(&self.type_len) {
            return Err(ParseFault::FieldOutOfRange {
                field: "tag type length",
                value: u64::from(self.type_len),
            });
        }
        Ok(())
    }
}

/// Decode the Tags payload into the flat list, in file order.
pub fn parse_tags(data: &[u8], sink: &dyn DiagnosticSink) -> Vec<Tag> {
    let mut tags = Vec::new();
    let mut reader = ByteReader::new(data);
    let mut chain = OffsetChain::new(data.len());

    while !reader.is_at_end() {
        let start = reader.position();
        match read_tag(&mut reader, &mut chain, start) {
            Ok((tag, next)) => {
                tags.push(tag);
                if let Err(fault) = reader.seek_to(next) {
                    reject(sink, start, fault);
                    break;
                }
            }
            Err(fault) => {
                reject(sink, start, fault);
                break;
            }
        }
    }

    tags
}

fn read_tag(
    reader: &mut ByteReader<'_>,
    chain: &mut OffsetChain,
    start: usize,
) -> std::result::Result<(Tag, usize), ParseFault> {
    let header = reader.read_fixed::<TagHeader>()?;
    let next = header.next_offset as usize;
    header.check()?;
    chain.admit(start, next)?;

    let name = reader.read_string(usize::from(header.name_len))?;
    let data_type = reader.read_string(usize::from(header.type_len))?;
    chain.settle(reader.position(), next)?;
    Ok((Tag::new(name, data_type, TagScope::from_wire(header.scope)), next))
}

fn reject(sink: &dyn DiagnosticSink, offset: usize, fault: ParseFault) {
    sink.report(Diagnostic::RecordRejected {
        kind: RecordKind::Tag,
        offset,
        fault,
    });
}

/// The flat list the writer emits: globals first, then routine-local tags.
///
/// Scope follows where the tag sits in the tree, not its `scope` field.
/// A local tag attached to several routines is written once.
pub fn tag_records(project: &Project) -> Vec<Tag> {
    let globals = project.global_tags.iter().map(|t| Tag {
        scope: TagScope::Global,
        ..t.clone()
    });

    let mut seen = HashSet::new();
    let locals = project
        .local_tags()
        .filter(|t| seen.insert((t.name.as_str(), t.data_type.as_str())))
        .map(|t| Tag {
            scope: TagScope::Local,
            ..t.clone()
        })
        .collect::<Vec<_>>();

    globals.chain(locals).collect()
}

fn record_size(tag: &Tag) -> usize {
    TAG_HEADER_LEN + string_size(&tag.name) + string_size(&tag.data_type)
}

pub(crate) fn tag_layout(tags: &[Tag]) -> RecordLayout {
    RecordLayout::from_sizes(tags.iter().map(record_size))
}

pub(crate) fn write_tags<W: Write>(
    w: &mut AcdWriter<W>,
    tags: &[Tag],
    layout: &RecordLayout,
) -> Result<()> {
    let base = w.offset();
    for (tag, span) in tags.iter().zip(&layout.spans) {
        debug_assert_eq!(w.offset() - base, span.start);
        w.write_u16(to_u16("tag name length", tag.name.len())?)?;
        w.write_u16(to_u16("tag type length", tag.data_type.len())?)?;
        w.write_u16(tag.scope.to_wire())?;
        w.write_u32(to_u32("tag next offset", span.end)?)?;
        w.write_string(&tag.name)?;
        w.write_string(&tag.data_type)?;
    }
    Ok(())
}

/// Encode a bare Tags payload (no section frame) from an explicit list.
pub fn encode_tags(tags: &[Tag]) -> Result<Vec<u8>> {
    let layout = tag_layout(tags);
    let mut w = AcdWriter::new(Vec::with_capacity(layout.len));
    write_tags(&mut w, tags, &layout)?;
    Ok(w.into_inner())
}

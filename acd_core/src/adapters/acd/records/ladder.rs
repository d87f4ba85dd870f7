//! LadderLogic section: one block per routine, each holding a chain of rungs.
//!
//! ```text
//! block:   [program string][routine string][rung_data_len u32][rung data]
//! rung:    [number u16][element_count u16][comment_len u16][reserved u16][next u32]
//!          [comment string, when comment_len > 0][element; element_count]
//! element: [code u16][tag_len u16][param_count u16][row u8][col u8][reserved u16]
//!          [tag string][parameter string; param_count]
//! ```
//!
//! Rung `next` offsets are relative to the start of the block's rung data.

use std::io::Write;

use binrw::binread;

use crate::domain::{Element, Instruction, LadderLogic, Position, Program, Rung};
use crate::error::{EncodingFault, Result};
use crate::ports::{Diagnostic, DiagnosticSink, ParseFault, RecordKind};

use super::super::layout::RecordLayout;
use super::super::protocol::{
    ELEMENT_HEADER_LEN, MAX_BLOCK_NAME_LEN, MAX_PARAMETER_LEN, MAX_RUNG_COMMENT_LEN,
    MAX_RUNG_ELEMENTS, RUNG_HEADER_LEN, STRING_PREFIX_LEN,
};
use super::super::wire::{
    string_size, to_u16, to_u32, AcdWriter, ByteReader, FixedRecord, OffsetChain,
};

#[binread]
#[br(little)]
#[derive(Debug, Clone, Copy)]
struct RungHeader {
    number: u16,
    element_count: u16,
    comment_len: u16,
    _reserved: u16,
    next_offset: u32,
}

impl FixedRecord for RungHeader {
    const LEN: usize = RUNG_HEADER_LEN;
}

impl RungHeader {
    fn check(&self) -> std::result::Result<(), ParseFault> {
        if !(1..=MAX_RUNG_ELEMENTS).contains(&self.element_count) {
            return Err(ParseFault::FieldOutOfRange {
                field: "rung element count",
                value: u64::from(self.element_count),
            });
        }
        if self.comment_len > MAX_RUNG_COMMENT_LEN {
            return Err(ParseFault::FieldOutOfRange {
                field: "rung comment length",
                value: u64::from(self.comment_len),
            });
        }
        Ok(())
    }
}

#[binread]
#[br(little)]
#[derive(Debug, Clone, Copy)]
struct ElementHeader {
    code: u16,
    tag_len: u16,
    param_count: u16,
    row: u8,
    col: u8,
    _reserved: u16,
}

impl FixedRecord for ElementHeader {
    const LEN: usize = ELEMENT_HEADER_LEN;
}

/// Ladder logic of one routine as found in the file, before it is attached
/// to the program tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutineLogic {
    pub program: String,
    pub routine: String,
    pub ladder_logic: LadderLogic,
}

/// Decode one block's rung data.
///
/// An unknown instruction code drops that element only. Any other element
/// failure abandons the rest of the rung, keeps what was read and resumes at
/// the next rung. A rung whose header fails its guards is dropped whole.
/// An unreadable header or a broken offset chain ends the stream.
pub fn parse_ladder_logic(data: &[u8], sink: &dyn DiagnosticSink) -> LadderLogic {
    let mut rungs = Vec::new();
    let mut reader = ByteReader::new(data);
    let mut chain = OffsetChain::new(data.len());

    while !reader.is_at_end() {
        let start = reader.position();
        let reject = |fault| {
            sink.report(Diagnostic::RecordRejected {
                kind: RecordKind::Rung,
                offset: start,
                fault,
            })
        };

        let header = match reader.read_fixed::<RungHeader>() {
            Ok(header) => header,
            Err(fault) => {
                reject(fault);
                break;
            }
        };
        let next = header.next_offset as usize;
        if let Err(fault) = chain.admit(start, next) {
            reject(fault);
            break;
        }

        let rung = match header.check() {
            Ok(()) => {
                let mut rung = Rung::new(header.number);
                if let Err(fault) = read_rung_body(&mut reader, &header, &mut rung, sink) {
                    sink.report(Diagnostic::RungElementsAborted {
                        rung: header.number,
                        parsed: rung.elements.len(),
                        declared: usize::from(header.element_count),
                        fault,
                    });
                }
                Some(rung)
            }
            Err(fault) => {
                reject(fault);
                None
            }
        };

        if let Err(fault) = chain.settle(reader.position(), next) {
            reject(fault);
            break;
        }
        rungs.extend(rung);
        if let Err(fault) = reader.seek_to(next) {
            reject(fault);
            break;
        }
    }

    LadderLogic { rungs }
}

fn read_rung_body(
    reader: &mut ByteReader<'_>,
    header: &RungHeader,
    rung: &mut Rung,
    sink: &dyn DiagnosticSink,
) -> std::result::Result<(), ParseFault> {
    if header.comment_len > 0 {
        rung.comment = Some(reader.read_string(usize::from(header.comment_len))?);
    }

    for _ in 0..header.element_count {
        let offset = reader.position();
        let element = reader.read_fixed::<ElementHeader>()?;
        let tag = reader.read_string(usize::from(element.tag_len))?;
        // Each parameter needs at least its length prefix.
        let capacity = usize::from(element.param_count)
            .min(reader.remaining_len() / STRING_PREFIX_LEN);
        let mut parameters = Vec::with_capacity(capacity);
        for _ in 0..element.param_count {
            parameters.push(reader.read_string(MAX_PARAMETER_LEN)?);
        }

        match Instruction::from_code(element.code) {
            Some(instruction) => rung.elements.push(
                Element::new(instruction, tag, Position::new(element.row, element.col))
                    .with_parameters(parameters),
            ),
            None => sink.report(Diagnostic::UnknownInstruction {
                code: element.code,
                offset,
            }),
        }
    }
    Ok(())
}

/// Decode the LadderLogic payload into per-routine blocks, in file order.
pub fn parse_ladder_section(data: &[u8], sink: &dyn DiagnosticSink) -> Vec<RoutineLogic> {
    let mut blocks = Vec::new();
    let mut reader = ByteReader::new(data);

    while !reader.is_at_end() {
        let start = reader.position();
        match read_block(&mut reader) {
            Ok((program, routine, rung_data)) => blocks.push(RoutineLogic {
                program,
                routine,
                ladder_logic: parse_ladder_logic(rung_data, sink),
            }),
            Err(fault) => {
                sink.report(Diagnostic::RecordRejected {
                    kind: RecordKind::LadderBlock,
                    offset: start,
                    fault,
                });
                break;
            }
        }
    }

    blocks
}

fn read_block<'a>(
    reader: &mut ByteReader<'a>,
) -> std::result::Result<(String, String, &'a [u8]), ParseFault> {
    let program = reader.read_string(MAX_BLOCK_NAME_LEN)?;
    let routine = reader.read_string(MAX_BLOCK_NAME_LEN)?;
    let len = reader.read_u32()? as usize;
    let rung_data = reader.read_slice(len)?;
    Ok((program, routine, rung_data))
}

/// Comments are only stored when non-empty.
fn stored_comment(rung: &Rung) -> Option<&str> {
    rung.comment.as_deref().filter(|c| !c.is_empty())
}

fn element_size(element: &Element) -> usize {
    ELEMENT_HEADER_LEN
        + string_size(&element.tag)
        + element
            .parameters
            .iter()
            .map(|p| string_size(p))
            .sum::<usize>()
}

fn rung_size(rung: &Rung) -> usize {
    RUNG_HEADER_LEN
        + stored_comment(rung).map(string_size).unwrap_or(0)
        + rung.elements.iter().map(element_size).sum::<usize>()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BlockLayout {
    pub rungs: RecordLayout,
    pub len: usize,
}

/// Offset tables for every routine's block, in program/routine order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LadderLayout {
    pub blocks: Vec<BlockLayout>,
    pub len: usize,
}

/// Size every block and check every element resolves to a wire code, so the
/// emission pass never stops halfway.
pub(crate) fn ladder_layout(programs: &[Program]) -> Result<LadderLayout> {
    let mut layout = LadderLayout::default();
    for program in programs {
        for routine in &program.routines {
            for rung in &routine.ladder_logic.rungs {
                if let Some(element) = rung.elements.iter().find(|e| e.code.wire_code().is_none()) {
                    return Err(EncodingFault::UnknownInstruction {
                        code: element.code.to_string(),
                        program: program.name.clone(),
                        routine: routine.name.clone(),
                        rung: rung.number,
                    }
                    .into());
                }
            }

            let rungs = RecordLayout::from_sizes(routine.ladder_logic.rungs.iter().map(rung_size));
            let len = string_size(&program.name) + string_size(&routine.name) + 4 + rungs.len;
            layout.len += len;
            layout.blocks.push(BlockLayout { rungs, len });
        }
    }
    Ok(layout)
}

pub(crate) fn write_ladder_logic<W: Write>(
    w: &mut AcdWriter<W>,
    programs: &[Program],
    layout: &LadderLayout,
) -> Result<()> {
    let routines = programs
        .iter()
        .flat_map(|p| p.routines.iter().map(move |r| (p, r)));

    for ((program, routine), block) in routines.zip(&layout.blocks) {
        w.write_string(&program.name)?;
        w.write_string(&routine.name)?;
        w.write_u32(to_u32("rung data length", block.rungs.len)?)?;

        for (rung, span) in routine.ladder_logic.rungs.iter().zip(&block.rungs.spans) {
            write_rung(w, rung, span.end)?;
        }
    }
    Ok(())
}

fn write_rung<W: Write>(w: &mut AcdWriter<W>, rung: &Rung, next: usize) -> Result<()> {
    let comment = stored_comment(rung);
    w.write_u16(rung.number)?;
    w.write_u16(to_u16("rung element count", rung.elements.len())?)?;
    w.write_u16(to_u16("rung comment length", comment.map_or(0, str::len))?)?;
    w.write_u16(0)?;
    w.write_u32(to_u32("rung next offset", next)?)?;
    if let Some(comment) = comment {
        w.write_string(comment)?;
    }

    for element in &rung.elements {
        let code = element
            .code
            .wire_code()
            .ok_or_else(|| EncodingFault::UnknownInstruction {
                code: element.code.to_string(),
                program: String::new(),
                routine: String::new(),
                rung: rung.number,
            })?;
        w.write_u16(code)?;
        w.write_u16(to_u16("element tag length", element.tag.len())?)?;
        w.write_u16(to_u16("element parameter count", element.parameters.len())?)?;
        w.write_u8(element.position.row)?;
        w.write_u8(element.position.col)?;
        w.write_u16(0)?;
        w.write_string(&element.tag)?;
        for parameter in &element.parameters {
            w.write_string(parameter)?;
        }
    }
    Ok(())
}

/// Encode the rung data of a single routine (no block prefix).
pub fn encode_ladder_logic(ladder: &LadderLogic) -> Result<Vec<u8>> {
    let layout = RecordLayout::from_sizes(ladder.rungs.iter().map(rung_size));
    let mut w = AcdWriter::new(Vec::with_capacity(layout.len));
    for (rung, span) in ladder.rungs.iter().zip(&layout.spans) {
        write_rung(&mut w, rung, span.end)?;
    }
    Ok(w.into_inner())
}

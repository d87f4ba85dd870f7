//! Programs section: offset-chained program records.
//!
//! ```text
//! [name_len u16][routine_count u16][next u32][name][routine name; routine_count]
//! ```

use std::io::Write;

use binrw::binread;

use crate::domain::{Program, Routine};
use crate::error::Result;
use crate::ports::{Diagnostic, DiagnosticSink, ParseFault, RecordKind};

use super::super::layout::RecordLayout;
use super::super::protocol::{
    MAX_PROGRAM_NAME_LEN, MAX_ROUTINE_COUNT, MAX_ROUTINE_NAME_LEN, PROGRAM_HEADER_LEN,
};
use super::super::wire::{
    string_size, to_u16, to_u32, AcdWriter, ByteReader, FixedRecord, OffsetChain,
};

#[binread]
#[br(little)]
#[derive(Debug, Clone, Copy)]
struct ProgramHeader {
    name_len: u16,
    routine_count: u16,
    next_offset: u32,
}

impl FixedRecord for ProgramHeader {
    const LEN: usize = PROGRAM_HEADER_LEN;
}

impl ProgramHeader {
    fn check(&self) -> std::result::Result<(), ParseFault> {
        if !(1..=MAX_PROGRAM_NAME_LEN).contains(&self.name_len) {
            return Err(ParseFault::FieldOutOfRange {
                field: "program name length",
                value: u64::from(self.name_len),
            });
        }
        if !(1..=MAX_ROUTINE_COUNT).contains(&self.routine_count) {
            return Err(ParseFault::FieldOutOfRange {
                field: "routine count",
                value: u64::from(self.routine_count),
            });
        }
        Ok(())
    }
}

/// Decode the Programs payload. Stops at the first record that fails its
/// header guards or breaks the offset chain; everything before it is kept.
pub fn parse_programs(data: &[u8], sink: &dyn DiagnosticSink) -> Vec<Program> {
    let mut programs = Vec::new();
    let mut reader = ByteReader::new(data);
    let mut chain = OffsetChain::new(data.len());

    while !reader.is_at_end() {
        let start = reader.position();
        let reject = |fault| {
            sink.report(Diagnostic::RecordRejected {
                kind: RecordKind::Program,
                offset: start,
                fault,
            })
        };

        let header = match reader.read_fixed::<ProgramHeader>() {
            Ok(header) => header,
            Err(fault) => {
                reject(fault);
                break;
            }
        };
        let next = header.next_offset as usize;
        if let Err(fault) = header.check().and_then(|_| chain.admit(start, next)) {
            reject(fault);
            break;
        }

        let name = match reader.read_string(usize::from(header.name_len)) {
            Ok(name) => name,
            Err(fault) => {
                reject(fault);
                break;
            }
        };

        let routines = read_routines(&mut reader, header.routine_count);
        if let Err(fault) = chain.settle(reader.position(), next) {
            reject(fault);
            break;
        }
        // A bad routine name costs only this program; its next offset is still trusted.
        match routines {
            Ok(routines) => programs.push(Program { name, routines }),
            Err(fault) => reject(fault),
        }

        if let Err(fault) = reader.seek_to(next) {
            reject(fault);
            break;
        }
    }

    programs
}

fn read_routines(
    reader: &mut ByteReader<'_>,
    count: u16,
) -> std::result::Result<Vec<Routine>, ParseFault> {
    (0..count)
        .map(|_| reader.read_string(MAX_ROUTINE_NAME_LEN).map(Routine::new))
        .collect()
}

fn record_size(program: &Program) -> usize {
    PROGRAM_HEADER_LEN
        + string_size(&program.name)
        + program
            .routines
            .iter()
            .map(|r| string_size(&r.name))
            .sum::<usize>()
}

pub(crate) fn program_layout(programs: &[Program]) -> RecordLayout {
    RecordLayout::from_sizes(programs.iter().map(record_size))
}

pub(crate) fn write_programs<W: Write>(
    w: &mut AcdWriter<W>,
    programs: &[Program],
    layout: &RecordLayout,
) -> Result<()> {
    let base = w.offset();
    for (program, span) in programs.iter().zip(&layout.spans) {
        debug_assert_eq!(w.offset() - base, span.start);
        w.write_u16(to_u16("program name length", program.name.len())?)?;
        w.write_u16(to_u16("routine count", program.routines.len())?)?;
        w.write_u32(to_u32("program next offset", span.end)?)?;
        w.write_string(&program.name)?;
        for routine in &program.routines {
            w.write_string(&routine.name)?;
        }
    }
    Ok(())
}

/// Encode a bare Programs payload (no section frame).
pub fn encode_programs(programs: &[Program]) -> Result<Vec<u8>> {
    let layout = program_layout(programs);
    let mut w = AcdWriter::new(Vec::with_capacity(layout.len));
    write_programs(&mut w, programs, &layout)?;
    Ok(w.into_inner())
}

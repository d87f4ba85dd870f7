//! Whole-file decode and encode: header, then Programs, Tags, LadderLogic.

use chrono::Utc;
use log::debug;

use crate::domain::{AcdDocument, Project};
use crate::error::Result;
use crate::ports::DiagnosticSink;

use super::attribution::{attach_ladder_logic, attribute_tags};
use super::config::AcdConfig;
use super::container::{metadata_blob, write_header, write_section_frame, AcdReader, Section};
use super::protocol::{SectionType, HEADER_LEN, SECTION_FRAME_LEN};
use super::records::{ladder, program, tag};
use super::wire::AcdWriter;

/// Decode a complete file. Only a bad header is an error; section damage
/// yields shorter lists plus diagnostics.
pub fn read_document(data: &[u8], sink: &dyn DiagnosticSink) -> Result<AcdDocument> {
    let reader = AcdReader::with_sink(data, sink);
    let header = reader.read_header()?;

    let mut programs_section: Option<Section<'_>> = None;
    let mut tags_section: Option<Section<'_>> = None;
    let mut ladder_section: Option<Section<'_>> = None;
    for section in reader.sections() {
        let slot = match section.section_type() {
            Some(SectionType::Programs) => &mut programs_section,
            Some(SectionType::Tags) => &mut tags_section,
            Some(SectionType::LadderLogic) => &mut ladder_section,
            None => {
                debug!(
                    "skipping section 0x{:02X} ({} bytes) at {}",
                    section.type_code,
                    section.len(),
                    section.offset
                );
                continue;
            }
        };
        // First section of each type wins.
        slot.get_or_insert(section);
    }

    let mut programs = programs_section
        .map(|s| program::parse_programs(s.data, sink))
        .unwrap_or_default();
    let flat_tags = tags_section
        .map(|s| tag::parse_tags(s.data, sink))
        .unwrap_or_default();
    let global_tags = attribute_tags(&mut programs, &flat_tags, sink);
    let blocks = ladder_section
        .map(|s| ladder::parse_ladder_section(s.data, sink))
        .unwrap_or_default();
    attach_ladder_logic(&mut programs, blocks, sink);

    debug!(
        "decoded {} programs, {} tags ({} global)",
        programs.len(),
        flat_tags.len(),
        global_tags.len()
    );

    let project = Project {
        version: header.version.clone(),
        programs,
        global_tags,
    };
    Ok(AcdDocument {
        header,
        project,
        flat_tags,
    })
}

/// Encode a complete file image.
pub fn write_project(
    project: &Project,
    config: &AcdConfig,
    sink: &dyn DiagnosticSink,
) -> Result<Vec<u8>> {
    // Pass 1: every offset and length.
    let program_layout = program::program_layout(&project.programs);
    let tags = tag::tag_records(project);
    let tag_layout = tag::tag_layout(&tags);
    let ladder_layout = ladder::ladder_layout(&project.programs)?;

    let total = HEADER_LEN
        + 3 * SECTION_FRAME_LEN
        + program_layout.len
        + tag_layout.len
        + ladder_layout.len;

    let timestamp_ms = config.timestamp_ms.unwrap_or_else(now_ms);
    let metadata = metadata_blob(config, timestamp_ms, sink);

    // Pass 2: emit.
    let mut w = AcdWriter::new(Vec::with_capacity(total));
    write_header(&mut w, &project.version, timestamp_ms, &metadata)?;

    write_section_frame(&mut w, SectionType::Programs, program_layout.len)?;
    program::write_programs(&mut w, &project.programs, &program_layout)?;

    write_section_frame(&mut w, SectionType::Tags, tag_layout.len)?;
    tag::write_tags(&mut w, &tags, &tag_layout)?;

    write_section_frame(&mut w, SectionType::LadderLogic, ladder_layout.len)?;
    ladder::write_ladder_logic(&mut w, &project.programs, &ladder_layout)?;

    debug_assert_eq!(w.offset(), total);
    debug!(
        "encoded {} programs, {} tags into {} bytes",
        project.programs.len(),
        tags.len(),
        w.offset()
    );
    Ok(w.into_inner())
}

fn now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Program, Routine, Tag};
    use crate::ports::{Diagnostic, DiagnosticLog};

    fn sample() -> Project {
        let mut main = Routine::new("Main");
        main.tags.push(Tag::local("Line_Main_Run", "BOOL"));
        Project {
            version: "33.0".into(),
            programs: vec![Program {
                name: "Line".into(),
                routines: vec![main],
            }],
            global_tags: vec![Tag::global("Estop", "BOOL")],
        }
    }

    fn encode(project: &Project) -> Vec<u8> {
        write_project(project, &AcdConfig::reproducible(0), &DiagnosticLog::new()).unwrap()
    }

    #[test]
    fn sections_follow_header_in_fixed_order() {
        let data = encode(&sample());
        let reader = AcdReader::new(&data);
        let types: Vec<u8> = reader.sections().map(|s| s.type_code).collect();
        assert_eq!(types, vec![0x02, 0x03, 0x04]);
        assert_eq!(&data[8..12], b"33.0");
    }

    #[test]
    fn fixed_timestamp_gives_identical_bytes() {
        let config = AcdConfig::reproducible(1_700_000_000_000);
        let a = write_project(&sample(), &config, &DiagnosticLog::new()).unwrap();
        let b = write_project(&sample(), &config, &DiagnosticLog::new()).unwrap();
        assert_eq!(a, b);
        assert_eq!(u64::from_le_bytes(a[12..20].try_into().unwrap()), 1_700_000_000_000);
    }

    #[test]
    fn missing_sections_decode_empty() {
        let data = encode(&Project::default());
        let header_only = &data[..HEADER_LEN];
        let doc = read_document(header_only, &DiagnosticLog::new()).unwrap();
        assert!(doc.project.programs.is_empty());
        assert!(doc.flat_tags.is_empty());
    }

    #[test]
    fn unknown_section_type_is_skipped() {
        let mut data = encode(&sample());
        let mut extra = vec![0x7F];
        extra.extend_from_slice(&3u32.to_le_bytes());
        extra.extend_from_slice(&[1, 2, 3]);
        data.splice(HEADER_LEN..HEADER_LEN, extra);

        let log = DiagnosticLog::new();
        let doc = read_document(&data, &log).unwrap();
        assert_eq!(doc.project.programs.len(), 1);
        assert_eq!(doc.project.global_tags, vec![Tag::global("Estop", "BOOL")]);
        assert!(log.is_empty());
    }

    #[test]
    fn only_the_first_section_of_a_type_is_used() {
        let mut data = encode(&sample());
        // Append a second, empty Programs section.
        data.push(0x02);
        data.extend_from_slice(&0u32.to_le_bytes());
        let doc = read_document(&data, &DiagnosticLog::new()).unwrap();
        assert_eq!(doc.project.programs.len(), 1);
    }

    #[test]
    fn oversized_metadata_still_encodes() {
        let config = AcdConfig::reproducible(0).with_metadata("note", "x".repeat(400));
        let log = DiagnosticLog::new();
        let data = write_project(&sample(), &config, &log).unwrap();
        assert!(log.contains(|d| matches!(d, Diagnostic::MetadataDropped { .. })));
        let doc = read_document(&data, &DiagnosticLog::new()).unwrap();
        assert!(doc.header.metadata.is_empty());
    }
}

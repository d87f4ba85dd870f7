use std::sync::Arc;

use acd_core::adapters::acd::records::{parse_ladder_logic, parse_programs, parse_tags};
use acd_core::adapters::acd::{AcdCodec, AcdConfig, AcdReader, SectionType};
use acd_core::domain::{
    Element, Instruction, InstructionCode, LadderLogic, Position, Program, Project, Routine, Rung,
    Tag, TagScope,
};
use acd_core::ports::{Diagnostic, DiagnosticLog, NullSink, ProjectCodec};
use acd_core::AcdError;

fn codec() -> (AcdCodec, Arc<DiagnosticLog>) {
    let log = Arc::new(DiagnosticLog::new());
    let codec = AcdCodec::new(AcdConfig::reproducible(1_700_000_000_000)).with_sink(log.clone());
    (codec, log)
}

fn motor_project() -> Project {
    let mut routine = Routine::new("MainRoutine");
    routine.tags.push(Tag::local("Motor_Start", "BOOL"));
    routine.ladder_logic.rungs.push(
        Rung::new(1)
            .with_comment("Motor start circuit")
            .with_element(Element::new(Instruction::Xic, "Motor_Start", Position::new(0, 0)))
            .with_element(Element::new(Instruction::Ote, "Motor_Running", Position::new(0, 1))),
    );
    Project {
        version: "1000".into(),
        programs: vec![Program {
            name: "MainProgram".into(),
            routines: vec![routine],
        }],
        global_tags: vec![Tag::global("System_Ready", "BOOL")],
    }
}

#[test]
fn motor_start_scenario() {
    let (codec, log) = codec();
    let bytes = codec.encode(&motor_project()).unwrap();
    let doc = codec.decode_document(&bytes).unwrap();
    let project = &doc.project;

    assert_eq!(project.version, "1000");
    assert_eq!(project.programs.len(), 1);
    let program = &project.programs[0];
    assert_eq!(program.name, "MainProgram");
    assert_eq!(program.routines.len(), 1);
    let routine = &program.routines[0];
    assert_eq!(routine.name, "MainRoutine");

    let rung = &routine.ladder_logic.rungs[0];
    assert_eq!(rung.comment.as_deref(), Some("Motor start circuit"));
    let elements: Vec<(&str, &str)> = rung
        .elements
        .iter()
        .map(|e| (e.code.as_str(), e.tag.as_str()))
        .collect();
    assert_eq!(elements, vec![("XIC", "Motor_Start"), ("OTE", "Motor_Running")]);

    assert_eq!(project.global_tags, vec![Tag::global("System_Ready", "BOOL")]);

    // "Motor" names no program: the tag is kept in the flat list only.
    assert!(routine.tags.is_empty());
    assert!(doc.flat_tags.contains(&Tag::local("Motor_Start", "BOOL")));
    assert!(log.contains(
        |d| matches!(d, Diagnostic::TagUnattributed { tag } if tag == "Motor_Start")
    ));
}

fn plant_project() -> Project {
    let mut main = Routine::new("MainRoutine");
    main.tags.push(Tag::local("Line1_MainRoutine_Run", "BOOL"));
    main.ladder_logic.rungs.push(
        Rung::new(0)
            .with_element(Element::new(Instruction::Xic, "Start", Position::new(0, 0)))
            .with_element(Element::new(Instruction::Xio, "Stop", Position::new(0, 1)))
            .with_element(Element::new(Instruction::Otl, "Run", Position::new(0, 2))),
    );
    main.ladder_logic.rungs.push(
        Rung::new(1).with_comment("Run-on delay").with_element(
            Element::new(Instruction::Ton, "RunDelay", Position::new(1, 0))
                .with_parameters(["5000", "0"]),
        ),
    );
    main.ladder_logic.rungs.push(
        Rung::new(2).with_element(
            Element::new(Instruction::Mov, "Speed", Position::new(0, 0))
                .with_parameters(["Setpoint", "Speed"]),
        ),
    );

    let mut faults = Routine::new("Faults");
    faults.tags.push(Tag::local("Line1_Faults_Code", "DINT"));
    faults.ladder_logic.rungs.push(
        Rung::new(0)
            .with_element(
                Element::new(Instruction::Grt, "Code", Position::new(0, 0))
                    .with_parameters(["Code", "0"]),
            )
            .with_element(Element::new(Instruction::Otu, "Run", Position::new(0, 1))),
    );

    Project {
        version: "32.0".into(),
        programs: vec![
            Program {
                name: "Line1".into(),
                routines: vec![main, faults],
            },
            Program {
                name: "Utilities".into(),
                routines: vec![Routine::new("Clock")],
            },
        ],
        global_tags: vec![Tag::global("Plant_Estop", "BOOL"), Tag::global("Shift", "DINT")],
    }
}

#[test]
fn round_trip_reproduces_project() {
    let (codec, log) = codec();
    let original = plant_project();
    let bytes = codec.encode(&original).unwrap();
    let decoded = codec.decode(&bytes).unwrap();
    assert_eq!(decoded, original);
    assert!(log.is_empty(), "unexpected diagnostics: {:?}", log.entries());
}

#[test]
fn round_trip_is_stable_for_broadcast_tags() {
    let (codec, _) = codec();
    let mut project = plant_project();
    // No routine segment: attaches to every routine of Line1.
    project.programs[0].routines[0].tags.push(Tag::local("Line1_Speed", "REAL"));

    let once = codec.decode(&codec.encode(&project).unwrap()).unwrap();
    for routine in &once.programs[0].routines {
        assert!(routine.tags.contains(&Tag::local("Line1_Speed", "REAL")));
    }
    let twice = codec.decode(&codec.encode(&once).unwrap()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn encoded_sections_hold_the_records() {
    let (codec, _) = codec();
    let bytes = codec.encode(&plant_project()).unwrap();
    let reader = AcdReader::new(&bytes);
    let sink = NullSink;

    let programs = reader.find_section(SectionType::Programs).unwrap();
    let names: Vec<String> = parse_programs(programs.data, &sink)
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Line1", "Utilities"]);

    let tags = parse_tags(reader.find_section(SectionType::Tags).unwrap().data, &sink);
    let scopes: Vec<TagScope> = tags.iter().map(|t| t.scope).collect();
    assert_eq!(
        scopes,
        vec![TagScope::Global, TagScope::Global, TagScope::Local, TagScope::Local]
    );
}

#[test]
fn short_or_unsigned_buffers_are_format_errors() {
    let (codec, _) = codec();
    assert!(matches!(codec.decode(&[]), Err(AcdError::Format(_))));
    assert!(matches!(codec.decode(&[0u8; 255]), Err(AcdError::Format(_))));

    let mut bytes = codec.encode(&plant_project()).unwrap();
    bytes[0..7].copy_from_slice(b"XXLogix");
    let err = codec.decode(&bytes).unwrap_err();
    assert!(matches!(err, AcdError::Format(_)));
    assert!(err.to_string().contains("Invalid ACD file signature"));
}

#[test]
fn record_codecs_tolerate_tiny_buffers() {
    let sink = NullSink;
    for data in [&[][..], &[0x01][..]] {
        assert!(parse_programs(data, &sink).is_empty());
        assert!(parse_tags(data, &sink).is_empty());
        assert_eq!(parse_ladder_logic(data, &sink), LadderLogic::default());
    }
}

#[test]
fn absent_section_is_not_found() {
    let mut bytes = vec![0u8; 256];
    bytes[..8].copy_from_slice(b"RSLogix5");
    let reader = AcdReader::new(&bytes);
    assert!(reader.find_section(SectionType::LadderLogic).is_none());

    let (codec, _) = codec();
    assert_eq!(codec.decode(&bytes).unwrap(), Project::default());
}

#[test]
fn unknown_instruction_fails_encode() {
    let (codec, _) = codec();
    let mut project = plant_project();
    project.programs[0].routines[1].ladder_logic.rungs[0]
        .elements
        .push(Element::new(InstructionCode::from("JSR"), "Sub", Position::new(0, 2)));

    match codec.encode(&project) {
        Err(AcdError::Encoding(fault)) => {
            let message = fault.to_string();
            assert!(message.contains("JSR"));
            assert!(message.contains("Line1/Faults"));
        }
        other => panic!("expected encoding error, got {other:?}"),
    }
}

#[test]
fn truncated_file_keeps_header_and_drops_damaged_section() {
    let (codec, log) = codec();
    let bytes = codec.encode(&plant_project()).unwrap();
    let cut = &bytes[..bytes.len() - 10];

    let doc = codec.decode_document(cut).unwrap();
    assert_eq!(doc.header.version, "32.0");
    // Programs and Tags are intact; the LadderLogic frame now overruns the buffer.
    assert_eq!(doc.project.programs.len(), 2);
    assert_eq!(doc.project.global_tags.len(), 2);
    assert!(doc
        .project
        .programs
        .iter()
        .flat_map(|p| &p.routines)
        .all(|r| r.ladder_logic.is_empty()));
    assert!(log.contains(|d| matches!(
        d,
        Diagnostic::SectionOutOfBounds {
            section_type: 0x04,
            ..
        }
    )));
}

#[test]
fn header_metadata_round_trips() {
    let log = Arc::new(DiagnosticLog::new());
    let codec = AcdCodec::new(AcdConfig::default().with_metadata("author", "line-eng"))
        .with_sink(log.clone());
    let bytes = codec.encode(&plant_project()).unwrap();
    let doc = codec.decode_document(&bytes).unwrap();

    assert_eq!(doc.header.signature, "RSLogix5");
    assert_eq!(doc.header.metadata["author"], "line-eng");
    assert!(doc.header.metadata.contains_key("lastModified"));
    assert!(doc.header.timestamp().is_some());
}

#[test]
fn project_json_uses_mnemonics() {
    let json = serde_json::to_value(motor_project()).unwrap();
    let element = &json["programs"][0]["routines"][0]["ladderLogic"]["rungs"][0]["elements"][0];
    assert_eq!(element["type"], "XIC");
    assert_eq!(json["globalTags"][0]["scope"], "Global");

    let back: Project = serde_json::from_value(json).unwrap();
    assert_eq!(back, motor_project());
}

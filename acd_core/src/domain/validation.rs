//! Pre-encode checks.
//!
//! None of these stop an encode (the writer only refuses unknown instructions
//! and unrepresentable field widths). They flag content the reader will drop
//! or truncate on the way back in.

use std::collections::HashSet;
use std::fmt;

use super::model::{Project, Rung};

pub const MAX_NAME_LEN: usize = 256;
pub const MAX_TAG_TYPE_LEN: usize = 64;
pub const MAX_RUNG_ELEMENTS: usize = 100;
pub const MAX_COMMENT_LEN: usize = 1000;
pub const MAX_PARAMETER_LEN: usize = 256;
pub const MAX_ROUTINES: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyName { location: String },
    DuplicateProgram { name: String },
    DuplicateRoutine { program: String, routine: String },
    NoRoutines { program: String },
    TooManyRoutines { program: String, count: usize },
    NameTooLong { location: String, len: usize },
    TagTypeTooLong { tag: String, len: usize },
    EmptyRung { location: String, rung: u16 },
    TooManyElements { location: String, rung: u16, count: usize },
    CommentTooLong { location: String, rung: u16, len: usize },
    ParameterTooLong { location: String, rung: u16, len: usize },
    UnrecognizedInstruction { location: String, rung: u16, code: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyName { location } => write!(f, "{location}: empty name"),
            ValidationIssue::DuplicateProgram { name } => write!(f, "duplicate program '{name}'"),
            ValidationIssue::DuplicateRoutine { program, routine } => {
                write!(f, "duplicate routine '{routine}' in program '{program}'")
            }
            ValidationIssue::NoRoutines { program } => {
                write!(f, "program '{program}' has no routines and will not be read back")
            }
            ValidationIssue::TooManyRoutines { program, count } => {
                write!(f, "program '{program}' has {count} routines (max {MAX_ROUTINES})")
            }
            ValidationIssue::NameTooLong { location, len } => {
                write!(f, "{location}: name is {len} bytes (max {MAX_NAME_LEN})")
            }
            ValidationIssue::TagTypeTooLong { tag, len } => {
                write!(f, "tag '{tag}': type name is {len} bytes (max {MAX_TAG_TYPE_LEN})")
            }
            ValidationIssue::EmptyRung { location, rung } => {
                write!(f, "{location} rung {rung}: no elements, rung will be skipped on read")
            }
            ValidationIssue::TooManyElements { location, rung, count } => write!(
                f,
                "{location} rung {rung}: {count} elements (max {MAX_RUNG_ELEMENTS})"
            ),
            ValidationIssue::CommentTooLong { location, rung, len } => write!(
                f,
                "{location} rung {rung}: comment is {len} bytes (max {MAX_COMMENT_LEN})"
            ),
            ValidationIssue::ParameterTooLong { location, rung, len } => write!(
                f,
                "{location} rung {rung}: parameter is {len} bytes (max {MAX_PARAMETER_LEN})"
            ),
            ValidationIssue::UnrecognizedInstruction { location, rung, code } => {
                write!(f, "{location} rung {rung}: unrecognized instruction '{code}'")
            }
        }
    }
}

pub fn validate_project(project: &Project) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut program_names = HashSet::new();

    for program in &project.programs {
        check_name(&mut issues, &program.name, || format!("program '{}'", program.name));
        if !program_names.insert(program.name.as_str()) {
            issues.push(ValidationIssue::DuplicateProgram {
                name: program.name.clone(),
            });
        }
        if program.routines.is_empty() {
            issues.push(ValidationIssue::NoRoutines {
                program: program.name.clone(),
            });
        }
        if program.routines.len() > MAX_ROUTINES {
            issues.push(ValidationIssue::TooManyRoutines {
                program: program.name.clone(),
                count: program.routines.len(),
            });
        }

        let mut routine_names = HashSet::new();
        for routine in &program.routines {
            let location = format!("{}/{}", program.name, routine.name);
            check_name(&mut issues, &routine.name, || location.clone());
            if !routine_names.insert(routine.name.as_str()) {
                issues.push(ValidationIssue::DuplicateRoutine {
                    program: program.name.clone(),
                    routine: routine.name.clone(),
                });
            }
            for rung in &routine.ladder_logic.rungs {
                check_rung(&mut issues, &location, rung);
            }
        }
    }

    for tag in project.global_tags.iter().chain(project.local_tags()) {
        check_name(&mut issues, &tag.name, || format!("tag '{}'", tag.name));
        if tag.data_type.len() > MAX_TAG_TYPE_LEN {
            issues.push(ValidationIssue::TagTypeTooLong {
                tag: tag.name.clone(),
                len: tag.data_type.len(),
            });
        }
    }

    issues
}

fn check_name(issues: &mut Vec<ValidationIssue>, name: &str, location: impl Fn() -> String) {
    if name.is_empty() {
        issues.push(ValidationIssue::EmptyName { location: location() });
    } else if name.len() > MAX_NAME_LEN {
        issues.push(ValidationIssue::NameTooLong {
            location: location(),
            len: name.len(),
        });
    }
}

fn check_rung(issues: &mut Vec<ValidationIssue>, location: &str, rung: &Rung) {
    let count = rung.elements.len();
    if count == 0 {
        issues.push(ValidationIssue::EmptyRung {
            location: location.to_string(),
            rung: rung.number,
        });
    } else if count > MAX_RUNG_ELEMENTS {
        issues.push(ValidationIssue::TooManyElements {
            location: location.to_string(),
            rung: rung.number,
            count,
        });
    }

    if let Some(comment) = &rung.comment {
        if comment.len() > MAX_COMMENT_LEN {
            issues.push(ValidationIssue::CommentTooLong {
                location: location.to_string(),
                rung: rung.number,
                len: comment.len(),
            });
        }
    }

    for element in &rung.elements {
        if element.code.instruction().is_none() {
            issues.push(ValidationIssue::UnrecognizedInstruction {
                location: location.to_string(),
                rung: rung.number,
                code: element.code.to_string(),
            });
        }
        for parameter in &element.parameters {
            if parameter.len() > MAX_PARAMETER_LEN {
                issues.push(ValidationIssue::ParameterTooLong {
                    location: location.to_string(),
                    rung: rung.number,
                    len: parameter.len(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instruction::Instruction;
    use crate::domain::model::{Element, Position, Program, Routine, Tag};

    fn project_with_rung(rung: Rung) -> Project {
        let mut routine = Routine::new("Main");
        routine.ladder_logic.rungs.push(rung);
        let mut program = Program::new("Line1");
        program.routines.push(routine);
        Project {
            version: "1000".into(),
            programs: vec![program],
            global_tags: Vec::new(),
        }
    }

    #[test]
    fn clean_project_has_no_issues() {
        let rung =
            Rung::new(0).with_element(Element::new(Instruction::Xic, "Start", Position::new(0, 0)));
        assert!(validate_project(&project_with_rung(rung)).is_empty());
    }

    #[test]
    fn flags_content_the_reader_would_drop() {
        let rung = Rung::new(3)
            .with_comment("x".repeat(MAX_COMMENT_LEN + 1))
            .with_element(Element::new("JSR", "Sub", Position::new(0, 0)));
        let mut project = project_with_rung(rung);
        project.programs.push(Program::new("Line1"));
        project.global_tags.push(Tag::global("Wide", "T".repeat(65)));

        let issues = validate_project(&project);
        assert!(issues.contains(&ValidationIssue::DuplicateProgram { name: "Line1".into() }));
        assert!(issues.contains(&ValidationIssue::NoRoutines { program: "Line1".into() }));
        assert!(issues.contains(&ValidationIssue::TagTypeTooLong { tag: "Wide".into(), len: 65 }));
        assert!(issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::CommentTooLong { rung: 3, .. })));
        assert!(issues.iter().any(|i| matches!(
            i,
            ValidationIssue::UnrecognizedInstruction { code, .. } if code == "JSR"
        )));
    }

    #[test]
    fn empty_rung_is_reported() {
        let issues = validate_project(&project_with_rung(Rung::new(7)));
        assert_eq!(
            issues,
            vec![ValidationIssue::EmptyRung {
                location: "Line1/Main".into(),
                rung: 7
            }]
        );
    }
}

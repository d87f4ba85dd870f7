//! Links the flat Tags and LadderLogic sections into the program tree.

use log::debug;

use crate::domain::{Program, Tag, TagScope};
use crate::ports::{Diagnostic, DiagnosticSink};

use super::records::RoutineLogic;

/// Distribute local tags over routines and return the global ones.
///
/// A local tag named `<Program>_<Routine>_...` goes to that routine. When the
/// second segment names no routine of the program, the tag goes to every
/// routine of it. A tag whose first segment names no program stays out of
/// the tree.
pub fn attribute_tags(
    programs: &mut [Program],
    tags: &[Tag],
    sink: &dyn DiagnosticSink,
) -> Vec<Tag> {
    let mut globals = Vec::new();
    for tag in tags {
        match tag.scope {
            TagScope::Global => globals.push(tag.clone()),
            TagScope::Local => attach_local(programs, tag, sink),
        }
    }
    globals
}

fn attach_local(programs: &mut [Program], tag: &Tag, sink: &dyn DiagnosticSink) {
    let mut segments = tag.name.split('_');
    let prefix = segments.next().unwrap_or_default();

    let Some(program) = programs.iter_mut().find(|p| p.name == prefix) else {
        sink.report(Diagnostic::TagUnattributed {
            tag: tag.name.clone(),
        });
        return;
    };

    if let Some(routine) = segments.next().and_then(|name| program.routine_mut(name)) {
        routine.tags.push(tag.clone());
        return;
    }

    debug!("tag '{}' shared by all routines of '{}'", tag.name, program.name);
    for routine in &mut program.routines {
        routine.tags.push(tag.clone());
    }
}

/// Attach decoded ladder blocks to their routines. Repeated blocks for the
/// same routine append their rungs.
pub fn attach_ladder_logic(
    programs: &mut [Program],
    blocks: Vec<RoutineLogic>,
    sink: &dyn DiagnosticSink,
) {
    for block in blocks {
        let routine = programs
            .iter_mut()
            .find(|p| p.name == block.program)
            .and_then(|p| p.routine_mut(&block.routine));

        match routine {
            Some(routine) => routine.ladder_logic.rungs.extend(block.ladder_logic.rungs),
            None => sink.report(Diagnostic::LadderLogicUnresolved {
                program: block.program,
                routine: block.routine,
            }),
        }
    }
}

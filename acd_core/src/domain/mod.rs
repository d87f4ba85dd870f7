pub mod document;
pub mod instruction;
pub mod model;
pub mod validation;

pub use document::{AcdDocument, Header};
pub use instruction::{Instruction, InstructionCode};
pub use model::{Element, LadderLogic, Position, Program, Project, Routine, Rung, Tag, TagScope};
pub use validation::{validate_project, ValidationIssue};

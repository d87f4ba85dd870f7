//! Per-section record codecs.

pub mod ladder;
pub mod program;
pub mod tag;

pub use ladder::{encode_ladder_logic, parse_ladder_logic, parse_ladder_section, RoutineLogic};
pub use program::{encode_programs, parse_programs};
pub use tag::{encode_tags, parse_tags, tag_records};

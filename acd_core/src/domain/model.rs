use serde::{Deserialize, Serialize};

use super::instruction::InstructionCode;

/// Decoded project: the object handed to the editor and back to the encoder.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub version: String,
    #[serde(default)]
    pub programs: Vec<Program>,
    /// Tags with `Global` scope.
    #[serde(default)]
    pub global_tags: Vec<Tag>,
}

impl Project {
    pub fn program(&self, name: &str) -> Option<&Program> {
        self.programs.iter().find(|p| p.name == name)
    }

    pub fn program_mut(&mut self, name: &str) -> Option<&mut Program> {
        self.programs.iter_mut().find(|p| p.name == name)
    }

    /// Every routine-local tag, in program/routine order.
    pub fn local_tags(&self) -> impl Iterator<Item = &Tag> {
        self.programs
            .iter()
            .flat_map(|p| p.routines.iter())
            .flat_map(|r| r.tags.iter())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub name: String,
    #[serde(default)]
    pub routines: Vec<Routine>,
}

impl Program {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routines: Vec::new(),
        }
    }

    pub fn routine(&self, name: &str) -> Option<&Routine> {
        self.routines.iter().find(|r| r.name == name)
    }

    pub fn routine_mut(&mut self, name: &str) -> Option<&mut Routine> {
        self.routines.iter_mut().find(|r| r.name == name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub name: String,
    /// Routine-local tags (filled in by tag attribution on decode).
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub ladder_logic: LadderLogic,
}

impl Routine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            ladder_logic: LadderLogic::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TagScope {
    #[default]
    Local,
    Global,
}

impl TagScope {
    /// Scope word as stored in the tag record: 0 = Local, anything else = Global.
    pub fn from_wire(code: u16) -> Self {
        if code == 0 {
            TagScope::Local
        } else {
            TagScope::Global
        }
    }

    pub fn to_wire(self) -> u16 {
        match self {
            TagScope::Local => 0,
            TagScope::Global => 1,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub name: String,
    /// Free-form type name, e.g. "BOOL" or "TIMER".
    #[serde(rename = "type")]
    pub data_type: String,
    pub scope: TagScope,
    /// Not stored in the binary form; always empty after decode.
    #[serde(default)]
    pub description: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, scope: TagScope) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            scope,
            description: String::new(),
        }
    }

    pub fn local(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self::new(name, data_type, TagScope::Local)
    }

    pub fn global(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self::new(name, data_type, TagScope::Global)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct LadderLogic {
    #[serde(default)]
    pub rungs: Vec<Rung>,
}

impl LadderLogic {
    pub fn is_empty(&self) -> bool {
        self.rungs.is_empty()
    }
}

/// One row of ladder logic.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Rung {
    pub number: u16,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Rung {
    pub fn new(number: u16) -> Self {
        Self {
            number,
            elements: Vec::new(),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }
}

/// Grid cell of an element inside its rung.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    pub fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }
}

/// A single ladder instruction bound to a tag.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Element {
    #[serde(rename = "type")]
    pub code: InstructionCode,
    pub tag: String,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
}

impl Element {
    pub fn new(
        code: impl Into<InstructionCode>,
        tag: impl Into<String>,
        position: Position,
    ) -> Self {
        Self {
            code: code.into(),
            tag: tag.into(),
            position,
            parameters: Vec::new(),
        }
    }

    pub fn with_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }
}

//! Ladder instruction set and its numeric wire codes.
//!
//! `Instruction::code` and `Instruction::mnemonic` are the only places codes
//! and names are assigned; both the reader and the writer go through them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed ladder instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// Examine if closed (normally open contact)
    Xic,
    /// Examine if open (normally closed contact)
    Xio,
    /// Output energize
    Ote,
    /// Output latch
    Otl,
    /// Output unlatch
    Otu,
    /// Timer on delay
    Ton,
    /// Timer off delay
    Tof,
    /// Count up
    Ctu,
    /// Count down
    Ctd,
    Cmp,
    Equ,
    Grt,
    Les,
    Mov,
    Add,
    Sub,
    Mul,
    Div,
}

/// Every instruction, in wire-code order.
const ALL_INSTRUCTIONS: [Instruction; 18] = [
    Instruction::Xic,
    Instruction::Xio,
    Instruction::Ote,
    Instruction::Otl,
    Instruction::Otu,
    Instruction::Ton,
    Instruction::Tof,
    Instruction::Ctu,
    Instruction::Ctd,
    Instruction::Cmp,
    Instruction::Equ,
    Instruction::Grt,
    Instruction::Les,
    Instruction::Mov,
    Instruction::Add,
    Instruction::Sub,
    Instruction::Mul,
    Instruction::Div,
];

impl Instruction {
    pub fn all() -> impl Iterator<Item = Instruction> {
        ALL_INSTRUCTIONS.into_iter()
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Self::all().find(|instruction| instruction.code() == code)
    }

    /// Exact, case-sensitive mnemonic lookup.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        Self::all().find(|instruction| instruction.mnemonic() == mnemonic)
    }

    pub fn code(self) -> u16 {
        match self {
            Instruction::Xic => 0x01,
            Instruction::Xio => 0x02,
            Instruction::Ote => 0x03,
            Instruction::Otl => 0x04,
            Instruction::Otu => 0x05,
            Instruction::Ton => 0x06,
            Instruction::Tof => 0x07,
            Instruction::Ctu => 0x08,
            Instruction::Ctd => 0x09,
            Instruction::Cmp => 0x0A,
            Instruction::Equ => 0x0B,
            Instruction::Grt => 0x0C,
            Instruction::Les => 0x0D,
            Instruction::Mov => 0x0E,
            Instruction::Add => 0x0F,
            Instruction::Sub => 0x10,
            Instruction::Mul => 0x11,
            Instruction::Div => 0x12,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Instruction::Xic => "XIC",
            Instruction::Xio => "XIO",
            Instruction::Ote => "OTE",
            Instruction::Otl => "OTL",
            Instruction::Otu => "OTU",
            Instruction::Ton => "TON",
            Instruction::Tof => "TOF",
            Instruction::Ctu => "CTU",
            Instruction::Ctd => "CTD",
            Instruction::Cmp => "CMP",
            Instruction::Equ => "EQU",
            Instruction::Grt => "GRT",
            Instruction::Les => "LES",
            Instruction::Mov => "MOV",
            Instruction::Add => "ADD",
            Instruction::Sub => "SUB",
            Instruction::Mul => "MUL",
            Instruction::Div => "DIV",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Instruction slot of an element.
///
/// The decoder never produces `Unrecognized` (unknown wire codes are skipped),
/// but an editor may hand one in; the encoder rejects it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InstructionCode {
    Known(Instruction),
    Unrecognized(String),
}

impl InstructionCode {
    pub fn instruction(&self) -> Option<Instruction> {
        match self {
            InstructionCode::Known(instruction) => Some(*instruction),
            InstructionCode::Unrecognized(_) => None,
        }
    }

    pub fn wire_code(&self) -> Option<u16> {
        self.instruction().map(Instruction::code)
    }

    pub fn as_str(&self) -> &str {
        match self {
            InstructionCode::Known(instruction) => instruction.mnemonic(),
            InstructionCode::Unrecognized(name) => name,
        }
    }
}

impl From<Instruction> for InstructionCode {
    fn from(instruction: Instruction) -> Self {
        InstructionCode::Known(instruction)
    }
}

impl From<String> for InstructionCode {
    fn from(text: String) -> Self {
        match Instruction::from_mnemonic(&text) {
            Some(instruction) => InstructionCode::Known(instruction),
            None => InstructionCode::Unrecognized(text),
        }
    }
}

impl From<&str> for InstructionCode {
    fn from(text: &str) -> Self {
        InstructionCode::from(text.to_string())
    }
}

impl From<InstructionCode> for String {
    fn from(code: InstructionCode) -> Self {
        code.as_str().to_string()
    }
}

impl FromStr for InstructionCode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(InstructionCode::from(s))
    }
}

impl fmt::Display for InstructionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

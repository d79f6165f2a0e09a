//! Parsed representation of an LC-3 source file.
//!
//! A program is a flat sequence of `SourceLine`s in file order. Each line
//! carries an optional label, its content, and its source position. The
//! instruction enum maps one-to-one onto the ISA so both the validator and
//! the encoder can dispatch with a plain `match`.

use crate::error::Span;
use crate::lexer::token::BrFlags;

#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    pub label: Option<String>,
    pub content: LineContent,
    pub line_number: usize,
    pub span: Span,
}

/// Target of a PC-relative operand: a label resolved in pass 2, or a raw
/// numeric offset used directly.
#[derive(Debug, Clone, PartialEq)]
pub enum PcTarget {
    Label(String),
    Offset(i32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineContent {
    /// Blank or comment-only line.
    Empty,
    /// A line that failed to parse. Occupies exactly one word (a zero
    /// placeholder) so pass-1 and pass-2 addresses stay in agreement.
    Invalid,
    Orig(u16),
    End,
    FillImmediate(i32),
    FillLabel(String),
    Blkw(u16),
    Stringz(String),
    Instruction(Instruction),
}

impl LineContent {
    /// Number of words this line occupies in the output image.
    pub fn word_count(&self) -> u32 {
        match self {
            LineContent::Empty | LineContent::Orig(_) | LineContent::End => 0,
            LineContent::Invalid => 1,
            LineContent::FillImmediate(_) | LineContent::FillLabel(_) => 1,
            LineContent::Blkw(n) => *n as u32,
            LineContent::Stringz(s) => s.len() as u32 + 1,
            LineContent::Instruction(_) => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    AddReg { dr: u8, sr1: u8, sr2: u8 },
    AddImm { dr: u8, sr1: u8, imm5: i32 },
    AndReg { dr: u8, sr1: u8, sr2: u8 },
    AndImm { dr: u8, sr1: u8, imm5: i32 },
    Not { dr: u8, sr: u8 },

    Ld { dr: u8, target: PcTarget },
    Ldi { dr: u8, target: PcTarget },
    Ldr { dr: u8, base_r: u8, offset6: i32 },
    Lea { dr: u8, target: PcTarget },
    St { sr: u8, target: PcTarget },
    Sti { sr: u8, target: PcTarget },
    Str { sr: u8, base_r: u8, offset6: i32 },

    Br { flags: BrFlags, target: PcTarget },
    Jmp { base_r: u8 },
    Jsr { target: PcTarget },
    Jsrr { base_r: u8 },
    Ret,
    Rti,

    /// TRAP with an explicit hex vector.
    Trap { vector: i32 },
    Getc,
    Out,
    Puts,
    In,
    Putsp,
    Halt,
}

/// A single operand as seen by the validator, abstracted away from the
/// per-variant field names.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Reg(u8),
    Imm(i32),
    Target(PcTarget),
}

impl Instruction {
    pub fn mnemonic(&self) -> &'static str {
        use Instruction::*;
        match self {
            AddReg { .. } | AddImm { .. } => "ADD",
            AndReg { .. } | AndImm { .. } => "AND",
            Not { .. } => "NOT",
            Ld { .. } => "LD",
            Ldi { .. } => "LDI",
            Ldr { .. } => "LDR",
            Lea { .. } => "LEA",
            St { .. } => "ST",
            Sti { .. } => "STI",
            Str { .. } => "STR",
            Br { .. } => "BR",
            Jmp { .. } => "JMP",
            Jsr { .. } => "JSR",
            Jsrr { .. } => "JSRR",
            Ret => "RET",
            Rti => "RTI",
            Trap { .. } => "TRAP",
            Getc => "GETC",
            Out => "OUT",
            Puts => "PUTS",
            In => "IN",
            Putsp => "PUTSP",
            Halt => "HALT",
        }
    }

    /// Operands in source order, for checking against the spec table's
    /// declared signature.
    pub fn operands(&self) -> Vec<Operand> {
        use Instruction::*;
        match self {
            AddReg { dr, sr1, sr2 } | AndReg { dr, sr1, sr2 } => {
                vec![Operand::Reg(*dr), Operand::Reg(*sr1), Operand::Reg(*sr2)]
            }
            AddImm { dr, sr1, imm5 } | AndImm { dr, sr1, imm5 } => {
                vec![Operand::Reg(*dr), Operand::Reg(*sr1), Operand::Imm(*imm5)]
            }
            Not { dr, sr } => vec![Operand::Reg(*dr), Operand::Reg(*sr)],
            Ld { dr, target } | Ldi { dr, target } | Lea { dr, target } => {
                vec![Operand::Reg(*dr), Operand::Target(target.clone())]
            }
            St { sr, target } | Sti { sr, target } => {
                vec![Operand::Reg(*sr), Operand::Target(target.clone())]
            }
            Ldr { dr, base_r, offset6 } => vec![
                Operand::Reg(*dr),
                Operand::Reg(*base_r),
                Operand::Imm(*offset6),
            ],
            Str { sr, base_r, offset6 } => vec![
                Operand::Reg(*sr),
                Operand::Reg(*base_r),
                Operand::Imm(*offset6),
            ],
            Br { target, .. } | Jsr { target } => vec![Operand::Target(target.clone())],
            Jmp { base_r } | Jsrr { base_r } => vec![Operand::Reg(*base_r)],
            Trap { vector } => vec![Operand::Imm(*vector)],
            Ret | Rti | Getc | Out | Puts | In | Putsp | Halt => vec![],
        }
    }
}

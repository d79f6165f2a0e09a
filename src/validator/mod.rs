//! Operand validation against the instruction spec table.
//!
//! Runs between the parser and pass 1. The parser guarantees token-level
//! structure; this pass checks the things structure cannot: numeric operands
//! within the signed range of their bit field, trap vectors within x00-xFF,
//! label names well-formed, `.FILL` values representable in one word. Every
//! failure is a diagnostic; the line keeps its size so addresses computed in
//! pass 1 remain valid.

#[cfg(test)]
mod tests;

use crate::error::{AsmError, ErrorKind, Span};
use crate::parser::ast::{LineContent, Operand, PcTarget, SourceLine};
use crate::spec_table::{self, OperandType};

#[must_use]
pub fn validate(lines: &[SourceLine]) -> Vec<AsmError> {
    let mut errors = Vec::new();

    for line in lines {
        if let Some(label) = &line.label {
            check_label_name(label, line.span, &mut errors);
        }

        match &line.content {
            LineContent::Instruction(inst) => {
                // The parser only builds instructions it has a spec for, so a
                // miss here would be an internal inconsistency, not user error.
                let spec = spec_table::lookup(inst.mnemonic())
                    .unwrap_or_else(|| panic!("no spec entry for {}", inst.mnemonic()));
                for (ty, operand) in spec.operands.iter().zip(inst.operands()) {
                    check_operand(inst.mnemonic(), *ty, &operand, line.span, &mut errors);
                }
            }
            LineContent::FillImmediate(value) => {
                // One word: signed decimal int16 or unsigned hex uint16; the
                // lexer already folded hex into the signed range.
                if !(i16::MIN as i32..=0xFFFF).contains(value) {
                    errors.push(AsmError::new(
                        ErrorKind::OperandOutOfRange,
                        format!(".FILL value {value} does not fit in 16 bits"),
                        line.span,
                    ));
                }
            }
            LineContent::FillLabel(label) => {
                check_label_name(label, line.span, &mut errors);
            }
            _ => {}
        }
    }

    errors
}

fn check_operand(
    mnemonic: &str,
    ty: OperandType,
    operand: &Operand,
    span: Span,
    errors: &mut Vec<AsmError>,
) {
    match (ty, operand) {
        (OperandType::Reg | OperandType::BaseReg, Operand::Reg(_)) => {}
        (OperandType::RegOrImm5, Operand::Reg(_)) => {}
        (OperandType::RegOrImm5 | OperandType::Imm5, Operand::Imm(v)) => {
            check_range(mnemonic, "immediate", *v, -16, 15, span, errors);
        }
        (OperandType::Offset6, Operand::Imm(v)) => {
            check_range(mnemonic, "offset", *v, -32, 31, span, errors);
        }
        (OperandType::PcOffset9, Operand::Target(target)) => {
            check_target(mnemonic, target, 9, span, errors);
        }
        (OperandType::PcOffset11, Operand::Target(target)) => {
            check_target(mnemonic, target, 11, span, errors);
        }
        (OperandType::TrapVec8, Operand::Imm(v)) => {
            check_range(mnemonic, "trap vector", *v, 0x00, 0xFF, span, errors);
        }
        // Any other pairing means the parser built an operand the table does
        // not declare; surface it rather than encode garbage.
        (ty, operand) => {
            errors.push(AsmError::new(
                ErrorKind::InvalidOperandType,
                format!("{mnemonic}: operand {operand:?} does not satisfy {ty:?}"),
                span,
            ));
        }
    }
}

fn check_range(
    mnemonic: &str,
    what: &str,
    value: i32,
    min: i32,
    max: i32,
    span: Span,
    errors: &mut Vec<AsmError>,
) {
    if !(min..=max).contains(&value) {
        errors.push(AsmError::new(
            ErrorKind::OperandOutOfRange,
            format!("{mnemonic}: {what} {value} is out of range ({min} to {max})"),
            span,
        ));
    }
}

fn check_target(
    mnemonic: &str,
    target: &PcTarget,
    bits: u8,
    span: Span,
    errors: &mut Vec<AsmError>,
) {
    match target {
        PcTarget::Label(label) => check_label_name(label, span, errors),
        PcTarget::Offset(value) => {
            let max = (1 << (bits - 1)) - 1;
            let min = -(1 << (bits - 1));
            if !(min..=max).contains(value) {
                errors.push(AsmError::new(
                    ErrorKind::OperandOutOfRange,
                    format!("{mnemonic}: offset {value} exceeds {bits}-bit range ({min} to {max})"),
                    span,
                ));
            }
        }
    }
}

/// Labels start with a letter and continue with letters, digits, or
/// underscores.
fn check_label_name(label: &str, span: Span, errors: &mut Vec<AsmError>) {
    let mut chars = label.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        errors.push(AsmError::new(
            ErrorKind::InvalidLabelName,
            format!("invalid label name '{label}'"),
            span,
        ));
    }
}

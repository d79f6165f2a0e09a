//! Pass 1: symbol table construction and structural checking.
//!
//! Walks the parsed lines once with a running location counter, binding
//! every label to the address of the next word that will be emitted. The
//! pass is a small state machine over the segment structure:
//!
//! - `WaitingForOrig` — before any `.ORIG`. Content here is a structural
//!   error; recovery pretends a `.ORIG x3000` so addressing continues.
//! - `InSegment` — between `.ORIG` and `.END`.
//! - `BetweenSegments` — after `.END`. A further `.ORIG` opens the next
//!   segment (multi-segment units are one segment per `.ORIG`/`.END` pair);
//!   anything else is outside any segment and diagnosed.
//!
//! Pass 2 replays the same state machine when it lays out words, so the
//! addresses recorded here and the words emitted there always agree.

pub mod symbol_table;


use crate::error::{AsmError, ErrorKind, Span};
use crate::parser::ast::{LineContent, SourceLine};
use symbol_table::SymbolTable;

pub struct FirstPassResult {
    pub symbol_table: SymbolTable,
    pub source_lines: Vec<SourceLine>,
    pub errors: Vec<AsmError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnitState {
    WaitingForOrig,
    InSegment,
    BetweenSegments,
}

/// Fallback origin when source emits before any `.ORIG`.
pub(crate) const RECOVERY_ORIGIN: u16 = 0x3000;

#[must_use]
pub fn first_pass(lines: Vec<SourceLine>) -> FirstPassResult {
    let mut symbol_table = SymbolTable::new();
    let mut errors = Vec::new();
    let mut state = UnitState::WaitingForOrig;
    let mut location_counter: u16 = 0;
    let mut saw_orig = false;

    for line in &lines {
        // Segment boundaries first; they change state regardless of labels.
        match &line.content {
            LineContent::Orig(addr) => {
                if state == UnitState::InSegment {
                    errors.push(AsmError::new(
                        ErrorKind::MissingEnd,
                        "missing .END before this .ORIG",
                        line.span,
                    ));
                }
                state = UnitState::InSegment;
                location_counter = *addr;
                saw_orig = true;
                if let Some(label) = &line.label {
                    record_label(&mut symbol_table, label, *addr, line.span, &mut errors);
                }
                continue;
            }
            LineContent::End => {
                match state {
                    UnitState::InSegment => state = UnitState::BetweenSegments,
                    _ => errors.push(AsmError::new(
                        ErrorKind::CodeOutsideSegment,
                        ".END outside any .ORIG segment",
                        line.span,
                    )),
                }
                continue;
            }
            LineContent::Empty if line.label.is_none() => continue,
            _ => {}
        }

        match state {
            UnitState::WaitingForOrig => {
                errors.push(AsmError::new(
                    ErrorKind::MissingOrig,
                    "expected .ORIG before any instructions",
                    line.span,
                ));
                state = UnitState::InSegment;
                location_counter = RECOVERY_ORIGIN;
                saw_orig = true; // recovery already reported the problem
            }
            UnitState::BetweenSegments => {
                errors.push(AsmError::new(
                    ErrorKind::CodeOutsideSegment,
                    "code between .END and the next .ORIG",
                    line.span,
                ));
                continue;
            }
            UnitState::InSegment => {}
        }

        if let Some(label) = &line.label {
            record_label(
                &mut symbol_table,
                label,
                location_counter,
                line.span,
                &mut errors,
            );
        }

        let words = line.content.word_count();
        let next = location_counter as u32 + words;
        if next > 0x10000 {
            errors.push(AsmError::new(
                ErrorKind::AddressOverflow,
                format!(
                    "location counter would pass xFFFF (at x{location_counter:04X} + {words} words)"
                ),
                line.span,
            ));
            location_counter = 0xFFFF;
        } else {
            location_counter = next as u16;
        }
    }

    if !saw_orig {
        errors.push(AsmError::new(
            ErrorKind::MissingOrig,
            "no .ORIG directive found",
            Span::new(1, 1),
        ));
    }
    if state == UnitState::InSegment {
        errors.push(AsmError::new(
            ErrorKind::MissingEnd,
            "no .END directive found",
            Span::new(1, 1),
        ));
    }

    FirstPassResult {
        symbol_table,
        source_lines: lines,
        errors,
    }
}

fn record_label(
    table: &mut SymbolTable,
    label: &str,
    address: u16,
    span: Span,
    errors: &mut Vec<AsmError>,
) {
    if let Err(first_addr) = table.define(label, address) {
        errors.push(AsmError::duplicate_label(label, first_addr, span));
    }
}

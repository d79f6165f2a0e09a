//! Declarative macros generating parsers for the recurring operand shapes.
//!
//! Most LC-3 instructions fall into a handful of operand patterns; each
//! macro expands to a closure that checks the token layout for one pattern
//! and builds the AST node. Fixing a layout bug in a macro fixes it for
//! every mnemonic using that pattern.

/// `OP DR, SR1, SR2` or `OP DR, SR1, #imm5` (ADD, AND).
macro_rules! parse_reg_reg_or_imm {
    ($name:expr, $reg_variant:expr, $imm_variant:expr) => {
        |tokens: &[&$crate::lexer::token::Token]| -> Result<$crate::parser::ast::LineContent, $crate::error::AsmError> {
            use $crate::error::{AsmError, ErrorKind};
            use $crate::parser::ast::LineContent;

            if tokens.len() < 6 {
                return Err(AsmError::new(
                    ErrorKind::TooFewOperands,
                    format!("{} requires 3 operands: {} DR, SR1, SR2/imm5", $name, $name),
                    tokens[0].span,
                ));
            }
            $crate::parser::macros::expect_comma(tokens, 2)?;
            $crate::parser::macros::expect_comma(tokens, 4)?;
            let dr = $crate::parser::macros::expect_register(tokens, 1, $name)?;
            let sr1 = $crate::parser::macros::expect_register(tokens, 3, $name)?;

            if let Some(sr2) = $crate::parser::macros::token_to_register(tokens[5]) {
                $crate::parser::macros::ensure_no_extra(tokens, 6)?;
                Ok(LineContent::Instruction($reg_variant(dr, sr1, sr2)))
            } else if let Some(imm) = $crate::parser::macros::token_to_number(tokens[5]) {
                $crate::parser::macros::ensure_no_extra(tokens, 6)?;
                Ok(LineContent::Instruction($imm_variant(dr, sr1, imm)))
            } else {
                Err(AsmError::new(
                    ErrorKind::InvalidOperandType,
                    format!("{} third operand must be a register or immediate", $name),
                    tokens[5].span,
                ))
            }
        }
    };
}

/// `OP R, LABEL` or `OP R, #offset9` (LD, LDI, LEA, ST, STI).
macro_rules! parse_reg_target {
    ($name:expr, $variant:expr) => {
        |tokens: &[&$crate::lexer::token::Token]| -> Result<$crate::parser::ast::LineContent, $crate::error::AsmError> {
            use $crate::error::{AsmError, ErrorKind};
            use $crate::parser::ast::LineContent;

            if tokens.len() < 4 {
                return Err(AsmError::new(
                    ErrorKind::TooFewOperands,
                    format!("{} requires 2 operands: {} R, LABEL", $name, $name),
                    tokens[0].span,
                ));
            }
            $crate::parser::macros::expect_comma(tokens, 2)?;
            let reg = $crate::parser::macros::expect_register(tokens, 1, $name)?;
            let target = $crate::parser::macros::expect_pc_target(tokens, 3, $name)?;
            $crate::parser::macros::ensure_no_extra(tokens, 4)?;
            Ok(LineContent::Instruction($variant(reg, target)))
        }
    };
}

/// `OP R1, BaseR, #offset6` (LDR, STR).
macro_rules! parse_reg_reg_imm {
    ($name:expr, $variant:expr) => {
        |tokens: &[&$crate::lexer::token::Token]| -> Result<$crate::parser::ast::LineContent, $crate::error::AsmError> {
            use $crate::error::{AsmError, ErrorKind};
            use $crate::parser::ast::LineContent;

            if tokens.len() < 6 {
                return Err(AsmError::new(
                    ErrorKind::TooFewOperands,
                    format!("{} requires 3 operands: {} R, BaseR, #offset6", $name, $name),
                    tokens[0].span,
                ));
            }
            $crate::parser::macros::expect_comma(tokens, 2)?;
            $crate::parser::macros::expect_comma(tokens, 4)?;
            let r1 = $crate::parser::macros::expect_register(tokens, 1, $name)?;
            let base_r = $crate::parser::macros::expect_register(tokens, 3, $name)?;
            let offset = $crate::parser::macros::token_to_number(tokens[5]).ok_or_else(|| {
                AsmError::new(
                    ErrorKind::InvalidOperandType,
                    format!("{} third operand must be an immediate (#n)", $name),
                    tokens[5].span,
                )
            })?;
            $crate::parser::macros::ensure_no_extra(tokens, 6)?;
            Ok(LineContent::Instruction($variant(r1, base_r, offset)))
        }
    };
}

/// `OP BaseR` (JMP, JSRR).
macro_rules! parse_single_reg {
    ($name:expr, $variant:expr) => {
        |tokens: &[&$crate::lexer::token::Token]| -> Result<$crate::parser::ast::LineContent, $crate::error::AsmError> {
            use $crate::error::{AsmError, ErrorKind};
            use $crate::parser::ast::LineContent;

            if tokens.len() < 2 {
                return Err(AsmError::new(
                    ErrorKind::TooFewOperands,
                    format!("{} requires 1 operand: {} BaseR", $name, $name),
                    tokens[0].span,
                ));
            }
            let base_r = $crate::parser::macros::expect_register(tokens, 1, $name)?;
            $crate::parser::macros::ensure_no_extra(tokens, 2)?;
            Ok(LineContent::Instruction($variant(base_r)))
        }
    };
}

/// `OP LABEL` or `OP #offset` (JSR, and BR through its own parser).
macro_rules! parse_single_target {
    ($name:expr, $variant:expr) => {
        |tokens: &[&$crate::lexer::token::Token]| -> Result<$crate::parser::ast::LineContent, $crate::error::AsmError> {
            use $crate::error::{AsmError, ErrorKind};
            use $crate::parser::ast::LineContent;

            if tokens.len() < 2 {
                return Err(AsmError::new(
                    ErrorKind::TooFewOperands,
                    format!("{} requires a label or offset operand", $name),
                    tokens[0].span,
                ));
            }
            let target = $crate::parser::macros::expect_pc_target(tokens, 1, $name)?;
            $crate::parser::macros::ensure_no_extra(tokens, 2)?;
            Ok(LineContent::Instruction($variant(target)))
        }
    };
}

/// Mnemonics taking no operands (RET, RTI, GETC, OUT, PUTS, IN, PUTSP, HALT).
macro_rules! parse_no_operands {
    ($name:expr, $variant:expr) => {
        |tokens: &[&$crate::lexer::token::Token]| -> Result<$crate::parser::ast::LineContent, $crate::error::AsmError> {
            use $crate::error::{AsmError, ErrorKind};
            use $crate::parser::ast::LineContent;

            if tokens.len() > 1 {
                return Err(AsmError::new(
                    ErrorKind::TooManyOperands,
                    format!("{} takes no operands", $name),
                    tokens[1].span,
                ));
            }
            Ok(LineContent::Instruction($variant))
        }
    };
}

// Helpers the expanded macros call; re-exported here so the call sites can
// reach them through a single path.
pub(crate) use super::{
    ensure_no_extra, expect_comma, expect_pc_target, expect_register, token_to_number,
    token_to_register,
};

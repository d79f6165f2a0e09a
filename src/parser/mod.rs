//! Line parser: token stream -> `SourceLine` AST.
//!
//! The token stream is sliced on `Newline` tokens; each slice is parsed
//! independently. A line is `[LABEL] [MNEMONIC OPERANDS] [; comment]`, any
//! part optional. Structural problems (wrong operand count, missing commas,
//! wrong token kinds) are diagnosed here; numeric range checking is the
//! validator's job and label resolution is pass 2's.
//!
//! A line that fails to parse is recorded as `LineContent::Invalid`, which
//! occupies one zero word in the image so that every later label keeps the
//! address pass 1 computed for it.

#[macro_use]
mod macros;
pub mod ast;


use crate::error::{AsmError, ErrorKind, Span};
use crate::lexer::token::{Token, TokenKind};
use ast::{Instruction, LineContent, PcTarget, SourceLine};

pub struct ParseResult {
    pub lines: Vec<SourceLine>,
    pub errors: Vec<AsmError>,
}

#[must_use]
pub fn parse_lines(tokens: &[Token]) -> ParseResult {
    let mut lines = Vec::new();
    let mut errors = Vec::new();
    let mut line_start = 0;
    let mut line_number = 1;

    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Newline => {
                process_line(&tokens[line_start..i], line_number, &mut lines, &mut errors);
                line_start = i + 1;
                line_number += 1;
            }
            TokenKind::Eof => {
                process_line(&tokens[line_start..i], line_number, &mut lines, &mut errors);
                break;
            }
            _ => {}
        }
    }

    ParseResult { lines, errors }
}

fn process_line(
    tokens: &[Token],
    line_number: usize,
    lines: &mut Vec<SourceLine>,
    errors: &mut Vec<AsmError>,
) {
    let span = tokens
        .first()
        .map(|t| t.span)
        .unwrap_or_else(|| Span::new(line_number, 1));

    // Everything after the first comment token is ignored.
    let code_end = tokens
        .iter()
        .position(|t| matches!(t.kind, TokenKind::Comment(_)))
        .unwrap_or(tokens.len());
    let code: Vec<&Token> = tokens[..code_end].iter().collect();

    let mut push = |label: Option<String>, content: LineContent| {
        lines.push(SourceLine {
            label,
            content,
            line_number,
            span,
        });
    };

    if code.is_empty() {
        push(None, LineContent::Empty);
        return;
    }

    let (label, rest) = match &code[0].kind {
        TokenKind::Label(name) => (Some(name.clone()), &code[1..]),
        _ => (None, &code[..]),
    };

    if rest.is_empty() {
        // Label-only line: the label binds to the next emitted word.
        push(label, LineContent::Empty);
        return;
    }

    if !rest[0].kind.is_instruction_or_directive() {
        let (kind, message) = match &rest[0].kind {
            TokenKind::Label(name) => (
                ErrorKind::UnknownInstruction,
                format!("unknown instruction '{name}'"),
            ),
            _ => (
                ErrorKind::UnexpectedToken,
                format!("expected an instruction or directive, found '{}'", rest[0].lexeme),
            ),
        };
        errors.push(AsmError::new(kind, message, rest[0].span));
        push(label, LineContent::Invalid);
        return;
    }

    match parse_content(rest) {
        Ok(content) => push(label, content),
        Err(err) => {
            errors.push(err);
            push(label, LineContent::Invalid);
        }
    }
}

fn parse_content(tokens: &[&Token]) -> Result<LineContent, AsmError> {
    match &tokens[0].kind {
        TokenKind::OpAdd => parse_reg_reg_or_imm!(
            "ADD",
            |dr, sr1, sr2| Instruction::AddReg { dr, sr1, sr2 },
            |dr, sr1, imm5| Instruction::AddImm { dr, sr1, imm5 }
        )(tokens),
        TokenKind::OpAnd => parse_reg_reg_or_imm!(
            "AND",
            |dr, sr1, sr2| Instruction::AndReg { dr, sr1, sr2 },
            |dr, sr1, imm5| Instruction::AndImm { dr, sr1, imm5 }
        )(tokens),
        TokenKind::OpNot => parse_not(tokens),
        TokenKind::OpBr(flags) => {
            let flags = *flags;
            parse_single_target!("BR", move |target| Instruction::Br { flags, target })(tokens)
        }

        TokenKind::OpLd => {
            parse_reg_target!("LD", |dr, target| Instruction::Ld { dr, target })(tokens)
        }
        TokenKind::OpLdi => {
            parse_reg_target!("LDI", |dr, target| Instruction::Ldi { dr, target })(tokens)
        }
        TokenKind::OpLea => {
            parse_reg_target!("LEA", |dr, target| Instruction::Lea { dr, target })(tokens)
        }
        TokenKind::OpSt => {
            parse_reg_target!("ST", |sr, target| Instruction::St { sr, target })(tokens)
        }
        TokenKind::OpSti => {
            parse_reg_target!("STI", |sr, target| Instruction::Sti { sr, target })(tokens)
        }

        TokenKind::OpLdr => parse_reg_reg_imm!("LDR", |dr, base_r, offset6| Instruction::Ldr {
            dr,
            base_r,
            offset6
        })(tokens),
        TokenKind::OpStr => parse_reg_reg_imm!("STR", |sr, base_r, offset6| Instruction::Str {
            sr,
            base_r,
            offset6
        })(tokens),

        TokenKind::OpJmp => parse_single_reg!("JMP", |base_r| Instruction::Jmp { base_r })(tokens),
        TokenKind::OpJsr => {
            parse_single_target!("JSR", |target| Instruction::Jsr { target })(tokens)
        }
        TokenKind::OpJsrr => {
            parse_single_reg!("JSRR", |base_r| Instruction::Jsrr { base_r })(tokens)
        }

        TokenKind::OpTrap => parse_trap(tokens),

        TokenKind::OpRti => parse_no_operands!("RTI", Instruction::Rti)(tokens),
        TokenKind::PseudoRet => parse_no_operands!("RET", Instruction::Ret)(tokens),
        TokenKind::PseudoGetc => parse_no_operands!("GETC", Instruction::Getc)(tokens),
        TokenKind::PseudoOut => parse_no_operands!("OUT", Instruction::Out)(tokens),
        TokenKind::PseudoPuts => parse_no_operands!("PUTS", Instruction::Puts)(tokens),
        TokenKind::PseudoIn => parse_no_operands!("IN", Instruction::In)(tokens),
        TokenKind::PseudoPutsp => parse_no_operands!("PUTSP", Instruction::Putsp)(tokens),
        TokenKind::PseudoHalt => parse_no_operands!("HALT", Instruction::Halt)(tokens),

        TokenKind::DirOrig => parse_orig(tokens),
        TokenKind::DirEnd => parse_end(tokens),
        TokenKind::DirFill => parse_fill(tokens),
        TokenKind::DirBlkw => parse_blkw(tokens),
        TokenKind::DirStringz => parse_stringz(tokens),

        _ => Err(AsmError::new(
            ErrorKind::UnexpectedToken,
            "unexpected token in line",
            tokens[0].span,
        )),
    }
}

fn parse_not(tokens: &[&Token]) -> Result<LineContent, AsmError> {
    if tokens.len() < 4 {
        return Err(AsmError::new(
            ErrorKind::TooFewOperands,
            "NOT requires 2 operands: NOT DR, SR",
            tokens[0].span,
        ));
    }
    expect_comma(tokens, 2)?;
    let dr = expect_register(tokens, 1, "NOT")?;
    let sr = expect_register(tokens, 3, "NOT")?;
    ensure_no_extra(tokens, 4)?;
    Ok(LineContent::Instruction(Instruction::Not { dr, sr }))
}

fn parse_trap(tokens: &[&Token]) -> Result<LineContent, AsmError> {
    if tokens.len() < 2 {
        return Err(AsmError::new(
            ErrorKind::TooFewOperands,
            "TRAP requires a trap vector (e.g. TRAP x25)",
            tokens[0].span,
        ));
    }
    // Trap vectors are written in hex; the validator checks the x00-xFF range.
    let vector = match tokens[1].kind {
        TokenKind::NumHex(v) => v,
        _ => {
            return Err(AsmError::new(
                ErrorKind::InvalidOperandType,
                "TRAP requires a hex trap vector (e.g. TRAP x25)",
                tokens[1].span,
            ));
        }
    };
    ensure_no_extra(tokens, 2)?;
    Ok(LineContent::Instruction(Instruction::Trap { vector }))
}

fn parse_orig(tokens: &[&Token]) -> Result<LineContent, AsmError> {
    if tokens.len() < 2 {
        return Err(AsmError::new(
            ErrorKind::TooFewOperands,
            ".ORIG requires a numeric operand",
            tokens[0].span,
        ));
    }
    let value = token_to_number(tokens[1]).ok_or_else(|| {
        AsmError::new(
            ErrorKind::InvalidOperandType,
            ".ORIG requires a numeric operand",
            tokens[1].span,
        )
    })?;
    // Hex literals above 0x7FFF arrive as negative values (two's complement
    // over 16 bits), decimals as plain positives; both spellings of the full
    // address space must be accepted.
    if !(i16::MIN as i32..=0xFFFF).contains(&value) {
        return Err(AsmError::new(
            ErrorKind::InvalidOrigAddress,
            ".ORIG address must be in x0000-xFFFF",
            tokens[1].span,
        ));
    }
    ensure_no_extra(tokens, 2)?;
    Ok(LineContent::Orig(value as u16))
}

fn parse_end(tokens: &[&Token]) -> Result<LineContent, AsmError> {
    if tokens.len() > 1 {
        return Err(AsmError::new(
            ErrorKind::TooManyOperands,
            ".END takes no operands",
            tokens[1].span,
        ));
    }
    Ok(LineContent::End)
}

fn parse_fill(tokens: &[&Token]) -> Result<LineContent, AsmError> {
    if tokens.len() < 2 {
        return Err(AsmError::new(
            ErrorKind::TooFewOperands,
            ".FILL requires a numeric or label operand",
            tokens[0].span,
        ));
    }
    let content = if let Some(value) = token_to_number(tokens[1]) {
        LineContent::FillImmediate(value)
    } else if let TokenKind::Label(name) = &tokens[1].kind {
        LineContent::FillLabel(name.clone())
    } else {
        return Err(AsmError::new(
            ErrorKind::InvalidOperandType,
            ".FILL requires a numeric or label operand",
            tokens[1].span,
        ));
    };
    ensure_no_extra(tokens, 2)?;
    Ok(content)
}

fn parse_blkw(tokens: &[&Token]) -> Result<LineContent, AsmError> {
    if tokens.len() < 2 {
        return Err(AsmError::new(
            ErrorKind::TooFewOperands,
            ".BLKW requires a numeric operand",
            tokens[0].span,
        ));
    }
    let value = token_to_number(tokens[1]).ok_or_else(|| {
        AsmError::new(
            ErrorKind::InvalidOperandType,
            ".BLKW requires a numeric operand",
            tokens[1].span,
        )
    })?;
    // A negative count would silently wrap to a huge block; reject here so
    // pass 1 never sees a bogus size.
    if !(1..=0xFFFF).contains(&value) {
        return Err(AsmError::new(
            ErrorKind::InvalidBlkwCount,
            format!(".BLKW count {value} is out of range (must be 1-65535)"),
            tokens[1].span,
        ));
    }
    ensure_no_extra(tokens, 2)?;
    Ok(LineContent::Blkw(value as u16))
}

fn parse_stringz(tokens: &[&Token]) -> Result<LineContent, AsmError> {
    if tokens.len() < 2 {
        return Err(AsmError::new(
            ErrorKind::TooFewOperands,
            ".STRINGZ requires a string literal operand",
            tokens[0].span,
        ));
    }
    match &tokens[1].kind {
        TokenKind::StringLiteral(s) => {
            ensure_no_extra(tokens, 2)?;
            Ok(LineContent::Stringz(s.clone()))
        }
        _ => Err(AsmError::new(
            ErrorKind::InvalidOperandType,
            ".STRINGZ requires a string literal operand",
            tokens[1].span,
        )),
    }
}

// Shared helpers, pub(crate) so the macro expansions can reach them.

pub(crate) fn ensure_no_extra(tokens: &[&Token], expected_len: usize) -> Result<(), AsmError> {
    if tokens.len() > expected_len {
        return Err(AsmError::new(
            ErrorKind::UnexpectedToken,
            "unexpected token after instruction",
            tokens[expected_len].span,
        ));
    }
    Ok(())
}

pub(crate) fn expect_comma(tokens: &[&Token], idx: usize) -> Result<(), AsmError> {
    match tokens.get(idx).map(|t| &t.kind) {
        Some(TokenKind::Comma) => Ok(()),
        _ => Err(AsmError::new(
            ErrorKind::ExpectedComma,
            "expected ',' between operands",
            tokens.get(idx).unwrap_or(&tokens[0]).span,
        )),
    }
}

pub(crate) fn expect_register(tokens: &[&Token], idx: usize, name: &str) -> Result<u8, AsmError> {
    tokens
        .get(idx)
        .and_then(|t| token_to_register(t))
        .ok_or_else(|| {
            AsmError::new(
                ErrorKind::ExpectedRegister,
                format!("{name} expects a register (R0-R7) here"),
                tokens.get(idx).unwrap_or(&tokens[0]).span,
            )
        })
}

pub(crate) fn expect_pc_target(
    tokens: &[&Token],
    idx: usize,
    name: &str,
) -> Result<PcTarget, AsmError> {
    let token = *tokens.get(idx).ok_or_else(|| {
        AsmError::new(
            ErrorKind::ExpectedOperand,
            format!("{name} requires a label or offset operand"),
            tokens[0].span,
        )
    })?;
    match &token.kind {
        TokenKind::Label(label) => Ok(PcTarget::Label(label.clone())),
        _ => match token_to_number(token) {
            Some(value) => Ok(PcTarget::Offset(value)),
            None => Err(AsmError::new(
                ErrorKind::ExpectedOperand,
                format!("{name} requires a label or offset operand"),
                token.span,
            )),
        },
    }
}

pub(crate) fn token_to_number(token: &Token) -> Option<i32> {
    match token.kind {
        TokenKind::NumDecimal(v) | TokenKind::NumHex(v) => Some(v),
        _ => None,
    }
}

pub(crate) fn token_to_register(token: &Token) -> Option<u8> {
    match token.kind {
        TokenKind::Register(r) => Some(r),
        _ => None,
    }
}

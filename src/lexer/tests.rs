use crate::error::ErrorKind;
use crate::lexer::token::{BrFlags, TokenKind};
use crate::lexer::tokenize;

fn lex_ok(input: &str) -> Vec<TokenKind> {
    let result = tokenize(input);
    assert!(
        result.errors.is_empty(),
        "Unexpected errors: {:?}",
        result.errors
    );
    result.tokens.into_iter().map(|t| t.kind).collect()
}

fn lex_errors(input: &str) -> Vec<ErrorKind> {
    tokenize(input).errors.into_iter().map(|e| e.kind).collect()
}

#[test]
fn empty_input() {
    assert_eq!(lex_ok(""), vec![TokenKind::Eof]);
}

#[test]
fn blank_lines() {
    assert_eq!(
        lex_ok("\n\n"),
        vec![TokenKind::Newline, TokenKind::Newline, TokenKind::Eof]
    );
}

#[test]
fn crlf_is_one_newline() {
    assert_eq!(
        lex_ok("\r\n"),
        vec![TokenKind::Newline, TokenKind::Eof]
    );
}

#[test]
fn comment_only() {
    assert_eq!(
        lex_ok("; hello\n"),
        vec![
            TokenKind::Comment(" hello".into()),
            TokenKind::Newline,
            TokenKind::Eof
        ]
    );
}

#[test]
fn all_opcodes() {
    let kinds = lex_ok("ADD AND NOT LD LDI LDR LEA ST STI STR JMP JSR JSRR TRAP RTI");
    assert_eq!(
        kinds,
        vec![
            TokenKind::OpAdd,
            TokenKind::OpAnd,
            TokenKind::OpNot,
            TokenKind::OpLd,
            TokenKind::OpLdi,
            TokenKind::OpLdr,
            TokenKind::OpLea,
            TokenKind::OpSt,
            TokenKind::OpSti,
            TokenKind::OpStr,
            TokenKind::OpJmp,
            TokenKind::OpJsr,
            TokenKind::OpJsrr,
            TokenKind::OpTrap,
            TokenKind::OpRti,
            TokenKind::Eof
        ]
    );
}

#[test]
fn mnemonics_any_case() {
    assert_eq!(
        lex_ok("add Add ADD"),
        vec![
            TokenKind::OpAdd,
            TokenKind::OpAdd,
            TokenKind::OpAdd,
            TokenKind::Eof
        ]
    );
}

#[test]
fn trap_aliases() {
    assert_eq!(
        lex_ok("GETC OUT PUTS IN PUTSP HALT RET"),
        vec![
            TokenKind::PseudoGetc,
            TokenKind::PseudoOut,
            TokenKind::PseudoPuts,
            TokenKind::PseudoIn,
            TokenKind::PseudoPutsp,
            TokenKind::PseudoHalt,
            TokenKind::PseudoRet,
            TokenKind::Eof
        ]
    );
}

#[test]
fn all_br_variants() {
    let kinds = lex_ok("BR BRn BRz BRp BRnz BRnp BRzp BRnzp");
    assert_eq!(
        kinds,
        vec![
            TokenKind::OpBr(BrFlags::new(true, true, true)),
            TokenKind::OpBr(BrFlags::new(true, false, false)),
            TokenKind::OpBr(BrFlags::new(false, true, false)),
            TokenKind::OpBr(BrFlags::new(false, false, true)),
            TokenKind::OpBr(BrFlags::new(true, true, false)),
            TokenKind::OpBr(BrFlags::new(true, false, true)),
            TokenKind::OpBr(BrFlags::new(false, true, true)),
            TokenKind::OpBr(BrFlags::new(true, true, true)),
            TokenKind::Eof
        ]
    );
}

#[test]
fn br_with_bogus_suffix_is_a_label() {
    assert_eq!(
        lex_ok("BRX"),
        vec![TokenKind::Label("BRX".into()), TokenKind::Eof]
    );
}

#[test]
fn br_flag_bits() {
    assert_eq!(BrFlags::new(true, true, true).bits(), 0b111);
    assert_eq!(BrFlags::new(true, false, false).bits(), 0b100);
    assert_eq!(BrFlags::new(false, true, false).bits(), 0b010);
    assert_eq!(BrFlags::new(false, false, true).bits(), 0b001);
}

#[test]
fn registers() {
    assert_eq!(
        lex_ok("R0 r3 R7"),
        vec![
            TokenKind::Register(0),
            TokenKind::Register(3),
            TokenKind::Register(7),
            TokenKind::Eof
        ]
    );
}

#[test]
fn register_out_of_range() {
    assert_eq!(lex_errors("R8"), vec![ErrorKind::InvalidRegister]);
    assert_eq!(lex_errors("r9"), vec![ErrorKind::InvalidRegister]);
}

#[test]
fn register_like_identifier_is_a_label() {
    assert_eq!(
        lex_ok("R10"),
        vec![TokenKind::Label("R10".into()), TokenKind::Eof]
    );
}

#[test]
fn decimal_literals() {
    assert_eq!(
        lex_ok("#10 #-5 #+3 #0"),
        vec![
            TokenKind::NumDecimal(10),
            TokenKind::NumDecimal(-5),
            TokenKind::NumDecimal(3),
            TokenKind::NumDecimal(0),
            TokenKind::Eof
        ]
    );
}

#[test]
fn decimal_without_digits() {
    assert_eq!(lex_errors("#"), vec![ErrorKind::InvalidDecimalLiteral]);
    assert_eq!(lex_errors("#-"), vec![ErrorKind::InvalidDecimalLiteral]);
}

#[test]
fn hex_literals_are_twos_complement() {
    assert_eq!(
        lex_ok("x3000 xFFFF x8000 x0"),
        vec![
            TokenKind::NumHex(0x3000),
            TokenKind::NumHex(-1),
            TokenKind::NumHex(-32768),
            TokenKind::NumHex(0),
            TokenKind::Eof
        ]
    );
}

#[test]
fn hex_literal_too_wide() {
    assert_eq!(lex_errors("x10000"), vec![ErrorKind::InvalidHexLiteral]);
}

#[test]
fn hex_shaped_word_with_bad_digit_is_a_label() {
    assert_eq!(
        lex_ok("xG1"),
        vec![TokenKind::Label("xG1".into()), TokenKind::Eof]
    );
}

#[test]
fn labels_keep_their_case() {
    assert_eq!(
        lex_ok("Loop LOOP loop"),
        vec![
            TokenKind::Label("Loop".into()),
            TokenKind::Label("LOOP".into()),
            TokenKind::Label("loop".into()),
            TokenKind::Eof
        ]
    );
}

#[test]
fn string_literal_with_escapes() {
    assert_eq!(
        lex_ok("\"hi\\n\\t\\\"\\\\\\0\""),
        vec![
            TokenKind::StringLiteral("hi\n\t\"\\\0".into()),
            TokenKind::Eof
        ]
    );
}

#[test]
fn unterminated_string() {
    assert_eq!(lex_errors("\"abc"), vec![ErrorKind::UnterminatedString]);
    assert_eq!(lex_errors("\"abc\nHALT"), vec![ErrorKind::UnterminatedString]);
}

#[test]
fn invalid_escape() {
    assert_eq!(lex_errors("\"a\\qb\""), vec![ErrorKind::InvalidEscapeSequence]);
}

#[test]
fn directives() {
    assert_eq!(
        lex_ok(".ORIG .end .Fill .BLKW .STRINGZ"),
        vec![
            TokenKind::DirOrig,
            TokenKind::DirEnd,
            TokenKind::DirFill,
            TokenKind::DirBlkw,
            TokenKind::DirStringz,
            TokenKind::Eof
        ]
    );
}

#[test]
fn unknown_directive() {
    assert_eq!(lex_errors(".GLOBL"), vec![ErrorKind::UnknownDirective]);
}

#[test]
fn commas_and_whitespace() {
    assert_eq!(
        lex_ok("ADD R1, R2 ,\tR3"),
        vec![
            TokenKind::OpAdd,
            TokenKind::Register(1),
            TokenKind::Comma,
            TokenKind::Register(2),
            TokenKind::Comma,
            TokenKind::Register(3),
            TokenKind::Eof
        ]
    );
}

#[test]
fn unexpected_character() {
    assert_eq!(lex_errors("@"), vec![ErrorKind::UnexpectedCharacter]);
}

#[test]
fn full_line_with_comment() {
    assert_eq!(
        lex_ok("LOOP ADD R1, R1, #-1 ; decrement\n"),
        vec![
            TokenKind::Label("LOOP".into()),
            TokenKind::OpAdd,
            TokenKind::Register(1),
            TokenKind::Comma,
            TokenKind::Register(1),
            TokenKind::Comma,
            TokenKind::NumDecimal(-1),
            TokenKind::Comment(" decrement".into()),
            TokenKind::Newline,
            TokenKind::Eof
        ]
    );
}

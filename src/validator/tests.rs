use crate::error::ErrorKind;
use crate::lexer::tokenize;
use crate::parser::parse_lines;
use crate::validator::validate;

fn validate_source(input: &str) -> Vec<ErrorKind> {
    let lexed = tokenize(input);
    assert!(lexed.errors.is_empty(), "Lexer errors: {:?}", lexed.errors);
    let parsed = parse_lines(&lexed.tokens);
    assert!(
        parsed.errors.is_empty(),
        "Parser errors: {:?}",
        parsed.errors
    );
    validate(&parsed.lines).into_iter().map(|e| e.kind).collect()
}

#[test]
fn clean_program_passes() {
    let errors = validate_source(
        ".ORIG x3000\n\
         LOOP ADD R1, R1, #-1\n\
         LDR R0, R6, #31\n\
         STR R0, R6, #-32\n\
         BRp LOOP\n\
         JSR LOOP\n\
         TRAP x21\n\
         HALT\n\
         .END\n",
    );
    assert!(errors.is_empty(), "{errors:?}");
}

#[test]
fn imm5_bounds() {
    assert!(validate_source("ADD R0, R0, #15").is_empty());
    assert!(validate_source("ADD R0, R0, #-16").is_empty());
    assert_eq!(
        validate_source("ADD R0, R0, #16"),
        vec![ErrorKind::OperandOutOfRange]
    );
    assert_eq!(
        validate_source("AND R0, R0, #-17"),
        vec![ErrorKind::OperandOutOfRange]
    );
}

#[test]
fn offset6_bounds() {
    assert!(validate_source("LDR R0, R1, #31").is_empty());
    assert_eq!(
        validate_source("LDR R0, R1, #32"),
        vec![ErrorKind::OperandOutOfRange]
    );
    assert_eq!(
        validate_source("STR R0, R1, #-33"),
        vec![ErrorKind::OperandOutOfRange]
    );
}

#[test]
fn numeric_pc_offset9_bounds() {
    assert!(validate_source("LD R0, #255").is_empty());
    assert!(validate_source("BR #-256").is_empty());
    assert_eq!(
        validate_source("LD R0, #256"),
        vec![ErrorKind::OperandOutOfRange]
    );
    assert_eq!(
        validate_source("ST R0, #-257"),
        vec![ErrorKind::OperandOutOfRange]
    );
}

#[test]
fn numeric_pc_offset11_bounds() {
    assert!(validate_source("JSR #1023").is_empty());
    assert_eq!(
        validate_source("JSR #1024"),
        vec![ErrorKind::OperandOutOfRange]
    );
    assert_eq!(
        validate_source("JSR #-1025"),
        vec![ErrorKind::OperandOutOfRange]
    );
}

#[test]
fn trap_vector_bounds() {
    assert!(validate_source("TRAP x00").is_empty());
    assert!(validate_source("TRAP xFF").is_empty());
    assert_eq!(
        validate_source("TRAP x100"),
        vec![ErrorKind::OperandOutOfRange]
    );
}

#[test]
fn fill_value_bounds() {
    assert!(validate_source(".FILL #-32768").is_empty());
    assert!(validate_source(".FILL #65535").is_empty());
    assert!(validate_source(".FILL xFFFF").is_empty());
    assert_eq!(
        validate_source(".FILL #65536"),
        vec![ErrorKind::OperandOutOfRange]
    );
}

#[test]
fn label_definitions_must_start_with_a_letter() {
    assert_eq!(
        validate_source("_tmp ADD R0, R0, #1"),
        vec![ErrorKind::InvalidLabelName]
    );
    assert!(validate_source("tmp_1 ADD R0, R0, #1").is_empty());
}

#[test]
fn label_operands_are_checked_too() {
    assert_eq!(
        validate_source("BR _there"),
        vec![ErrorKind::InvalidLabelName]
    );
    assert_eq!(
        validate_source(".FILL _there"),
        vec![ErrorKind::InvalidLabelName]
    );
}

#[test]
fn every_error_carries_the_source_line() {
    let lexed = tokenize("ADD R0, R0, #0\nADD R0, R0, #99\n");
    let parsed = parse_lines(&lexed.tokens);
    let errors = validate(&parsed.lines);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].span.line, 2);
}

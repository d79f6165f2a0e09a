//! # LC-3 Assembler
//!
//! A two-pass assembler for the LC-3 (Little Computer 3) architecture,
//! producing a segment-based object image the companion `lc3-vm` crate
//! loads and executes.
//!
//! ## Pipeline
//!
//! 1. **Lexer** — tokenizes source text
//! 2. **Parser** — parses token lines into an AST
//! 3. **Validator** — checks operands against the instruction spec table
//! 4. **First pass** — builds the symbol table with a running location
//!    counter and checks segment structure
//! 5. **Encoder** — resolves labels to PC-relative offsets and emits one
//!    segment of 16-bit words per `.ORIG`/`.END` pair
//!
//! Every stage collects diagnostics instead of stopping at the first one; a
//! run with any diagnostic produces no object file.
//!
//! ## Example
//!
//! ```rust,no_run
//! use lc3_asm::{encoder::encode, first_pass::first_pass, lexer::tokenize,
//!               parser::parse_lines, validator::validate};
//!
//! let source = std::fs::read_to_string("program.asm").unwrap();
//! let lexed = tokenize(&source);
//! let parsed = parse_lines(&lexed.tokens);
//! let semantic_errors = validate(&parsed.lines);
//! let first = first_pass(parsed.lines);
//! let encoded = encode(&first);
//!
//! if lexed.errors.is_empty()
//!     && parsed.errors.is_empty()
//!     && semantic_errors.is_empty()
//!     && first.errors.is_empty()
//!     && encoded.errors.is_empty()
//! {
//!     lc3_asm::obj::write_file("program.obj", &encoded.segments).unwrap();
//! }
//! ```

pub mod diagnostics;
pub mod encoder;
pub mod error;
pub mod first_pass;
pub mod lexer;
pub mod obj;
pub mod parser;
pub mod spec_table;
pub mod validator;

//! Tokenizer for LC-3 assembly source.
//!
//! One token stream per file; `Newline` tokens delimit logical lines and the
//! parser slices on them. Numeric literals are `#`-decimal (signed) and
//! `x`-hex; hex is read as a 16-bit word and carried as its two's-complement
//! signed value, so `xFFFF` and `#-1` denote the same word. String literals
//! support the escapes `\n \r \t \\ \" \0`. Mnemonics match in any case;
//! anything that is not a mnemonic, register, or literal becomes a `Label`
//! token with its source case intact.
//!
//! The scanner works on whole byte runs rather than single characters:
//! `eat_while` consumes a run and hands back a slice of the source, so a
//! word, digit string, or comment body arrives in one piece with its
//! original spelling.

pub mod token;

#[cfg(test)]
mod tests;

use crate::error::{AsmError, ErrorKind, Span};
use token::{BrFlags, Token, TokenKind};

pub struct LexResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<AsmError>,
}

/// Byte-run scanner over the (ASCII) source, tracking line and column.
struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        if byte == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(byte)
    }

    /// Consume bytes while `pred` holds and return the run as a slice of the
    /// source. Callers only pass ASCII predicates, so the slice bounds always
    /// fall on character boundaries.
    fn eat_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if pred(b)) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    /// Span of the byte the scanner currently points at.
    fn location(&self) -> Span {
        Span::new(self.line, self.col)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.src.len()
    }
}

#[must_use]
pub fn tokenize(source: &str) -> LexResult {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    while !scanner.is_at_end() {
        match next_token(&mut scanner) {
            Ok(Some(token)) => tokens.push(token),
            Ok(None) => {}
            Err(err) => errors.push(err),
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        lexeme: String::new(),
        span: scanner.location(),
    });

    LexResult { tokens, errors }
}

fn next_token(scanner: &mut Scanner) -> Result<Option<Token>, AsmError> {
    scanner.eat_while(|b| b == b' ' || b == b'\t');

    let span = scanner.location();
    let Some(byte) = scanner.peek() else {
        return Ok(None);
    };

    match byte {
        b'\n' | b'\r' => {
            // \n, \r\n, and bare \r all collapse to one newline token.
            if scanner.peek() == Some(b'\r') {
                scanner.bump();
            }
            if scanner.peek() == Some(b'\n') {
                scanner.bump();
            }
            Ok(Some(token(TokenKind::Newline, "\n", span)))
        }
        b';' => {
            scanner.bump();
            let text = scanner.eat_while(|b| b != b'\n' && b != b'\r');
            Ok(Some(Token {
                lexeme: format!(";{text}"),
                kind: TokenKind::Comment(text.to_string()),
                span,
            }))
        }
        b',' => {
            scanner.bump();
            Ok(Some(token(TokenKind::Comma, ",", span)))
        }
        b'"' => lex_string(scanner, span).map(Some),
        b'#' => lex_decimal(scanner, span).map(Some),
        b'.' => lex_directive(scanner, span).map(Some),
        b if b.is_ascii_alphabetic() || b == b'_' => lex_word(scanner, span).map(Some),
        other => {
            scanner.bump();
            Err(AsmError::new(
                ErrorKind::UnexpectedCharacter,
                format!("unexpected character '{}'", other as char),
                span,
            ))
        }
    }
}

fn token(kind: TokenKind, lexeme: &str, span: Span) -> Token {
    Token {
        kind,
        lexeme: lexeme.to_string(),
        span,
    }
}

fn unescape(esc: u8) -> Option<char> {
    match esc {
        b'n' => Some('\n'),
        b'r' => Some('\r'),
        b't' => Some('\t'),
        b'\\' => Some('\\'),
        b'"' => Some('"'),
        b'0' => Some('\0'),
        _ => None,
    }
}

fn lex_string(scanner: &mut Scanner, span: Span) -> Result<Token, AsmError> {
    scanner.bump();
    let mut value = String::new();
    let mut raw = String::from("\"");

    loop {
        let byte = match scanner.peek() {
            None | Some(b'\n') | Some(b'\r') => {
                return Err(AsmError::new(
                    ErrorKind::UnterminatedString,
                    "unterminated string literal",
                    span,
                ));
            }
            Some(byte) => byte,
        };
        scanner.bump();
        raw.push(byte as char);

        match byte {
            b'"' => break,
            b'\\' => {
                let esc = scanner.peek().ok_or_else(|| {
                    AsmError::new(
                        ErrorKind::UnterminatedString,
                        "unterminated string literal",
                        span,
                    )
                })?;
                let Some(actual) = unescape(esc) else {
                    return Err(AsmError::new(
                        ErrorKind::InvalidEscapeSequence,
                        format!("invalid escape sequence '\\{}'", esc as char),
                        span,
                    ));
                };
                scanner.bump();
                raw.push(esc as char);
                value.push(actual);
            }
            _ => value.push(byte as char),
        }
    }

    Ok(Token {
        kind: TokenKind::StringLiteral(value),
        lexeme: raw,
        span,
    })
}

fn lex_decimal(scanner: &mut Scanner, span: Span) -> Result<Token, AsmError> {
    scanner.bump();
    let sign = match scanner.peek() {
        Some(s @ (b'-' | b'+')) => {
            scanner.bump();
            Some(s as char)
        }
        _ => None,
    };
    let digits = scanner.eat_while(|b| b.is_ascii_digit());

    if digits.is_empty() {
        return Err(AsmError::new(
            ErrorKind::InvalidDecimalLiteral,
            "expected digits after '#'",
            span,
        ));
    }

    let mut lexeme = String::from("#");
    if let Some(sign) = sign {
        lexeme.push(sign);
    }
    lexeme.push_str(digits);

    let value = lexeme[1..].parse::<i32>().map_err(|_| {
        AsmError::new(
            ErrorKind::InvalidDecimalLiteral,
            format!("invalid decimal literal '{lexeme}'"),
            span,
        )
    })?;

    Ok(Token {
        kind: TokenKind::NumDecimal(value),
        lexeme,
        span,
    })
}

fn lex_directive(scanner: &mut Scanner, span: Span) -> Result<Token, AsmError> {
    scanner.bump();
    let word = scanner.eat_while(|b| b.is_ascii_alphabetic());

    let kind = match word.to_ascii_uppercase().as_str() {
        "ORIG" => TokenKind::DirOrig,
        "END" => TokenKind::DirEnd,
        "FILL" => TokenKind::DirFill,
        "BLKW" => TokenKind::DirBlkw,
        "STRINGZ" => TokenKind::DirStringz,
        other => {
            return Err(AsmError::new(
                ErrorKind::UnknownDirective,
                format!("unknown directive .{other}"),
                span,
            ));
        }
    };

    Ok(Token {
        kind,
        lexeme: format!(".{word}"),
        span,
    })
}

fn lex_word(scanner: &mut Scanner, span: Span) -> Result<Token, AsmError> {
    let word = scanner.eat_while(|b| b.is_ascii_alphanumeric() || b == b'_');
    let upper = word.to_ascii_uppercase();

    // R0-R7 are registers; R8/R9 are almost certainly typos for one.
    if let Some(digit) = register_number(&upper) {
        if digit <= 7 {
            return Ok(token(TokenKind::Register(digit), word, span));
        }
        return Err(AsmError::new(
            ErrorKind::InvalidRegister,
            format!("invalid register R{digit} (must be R0-R7)"),
            span,
        ));
    }

    let kind = match upper.as_str() {
        "ADD" => TokenKind::OpAdd,
        "AND" => TokenKind::OpAnd,
        "NOT" => TokenKind::OpNot,
        "LD" => TokenKind::OpLd,
        "LDI" => TokenKind::OpLdi,
        "LDR" => TokenKind::OpLdr,
        "LEA" => TokenKind::OpLea,
        "ST" => TokenKind::OpSt,
        "STI" => TokenKind::OpSti,
        "STR" => TokenKind::OpStr,
        "JMP" => TokenKind::OpJmp,
        "JSR" => TokenKind::OpJsr,
        "JSRR" => TokenKind::OpJsrr,
        "TRAP" => TokenKind::OpTrap,
        "RTI" => TokenKind::OpRti,
        "RET" => TokenKind::PseudoRet,
        "GETC" => TokenKind::PseudoGetc,
        "OUT" => TokenKind::PseudoOut,
        "PUTS" => TokenKind::PseudoPuts,
        "IN" => TokenKind::PseudoIn,
        "PUTSP" => TokenKind::PseudoPutsp,
        "HALT" => TokenKind::PseudoHalt,
        _ => {
            if let Some(flags) = BrFlags::parse(&upper) {
                TokenKind::OpBr(flags)
            } else if let Some(value) = parse_hex_word(&upper) {
                match value {
                    Ok(v) => TokenKind::NumHex(v),
                    Err(msg) => {
                        return Err(AsmError::new(ErrorKind::InvalidHexLiteral, msg, span));
                    }
                }
            } else {
                // Labels keep their source spelling; matching is
                // case-sensitive.
                TokenKind::Label(word.to_string())
            }
        }
    };

    Ok(token(kind, word, span))
}

/// `R` or `r` followed by exactly one digit.
fn register_number(upper: &str) -> Option<u8> {
    let rest = upper.strip_prefix('R')?;
    let mut digits = rest.chars();
    match (digits.next(), digits.next()) {
        (Some(d), None) => d.to_digit(10).map(|d| d as u8),
        _ => None,
    }
}

/// Try to read an uppercased word as an `x`-prefixed hex literal.
///
/// Returns `None` when the word is not hex-shaped at all (it is then a label
/// candidate), `Some(Err)` when it is hex-shaped but does not fit 16 bits.
fn parse_hex_word(upper: &str) -> Option<Result<i32, String>> {
    let digits = upper.strip_prefix('X')?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    Some(match u32::from_str_radix(digits, 16) {
        Ok(v) if v <= 0xFFFF => Ok(word_to_signed(v)),
        Ok(_) => Err(format!("hex literal x{digits} exceeds 16 bits")),
        Err(_) => Err(format!("invalid hex literal x{digits}")),
    })
}

/// Reinterpret a 16-bit word as its two's-complement signed value.
fn word_to_signed(v: u32) -> i32 {
    if v > 0x7FFF {
        v as i32 - 0x10000
    } else {
        v as i32
    }
}

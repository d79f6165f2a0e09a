//! Token types for LC-3 assembly.

use crate::error::Span;

/// A single lexical token: its kind, the source text it came from, and where
/// it sits in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Opcodes
    OpAdd,
    OpAnd,
    OpNot,
    OpBr(BrFlags),
    OpJmp,
    OpJsr,
    OpJsrr,
    OpLd,
    OpLdi,
    OpLdr,
    OpLea,
    OpSt,
    OpSti,
    OpStr,
    OpTrap,
    OpRti,

    // Pseudo-ops. RET assembles to JMP R7; the rest are TRAP aliases.
    PseudoRet,
    PseudoGetc,
    PseudoOut,
    PseudoPuts,
    PseudoIn,
    PseudoPutsp,
    PseudoHalt,

    // Directives
    DirOrig,
    DirEnd,
    DirFill,
    DirBlkw,
    DirStringz,

    // Operands
    Register(u8),
    /// `#`-prefixed signed decimal.
    NumDecimal(i32),
    /// `x`-prefixed hex, interpreted as a 16-bit word and carried as its
    /// two's-complement signed value (xFFFF -> -1).
    NumHex(i32),
    /// Double-quoted string with escapes already processed.
    StringLiteral(String),
    /// Identifier in its original case. Symbol lookup is case-sensitive, so
    /// the lexer must not normalize these.
    Label(String),

    Comma,
    Newline,
    Comment(String),
    Eof,
}

/// Condition flags selected by a BR mnemonic suffix.
///
/// Any combination of n/z/p may follow `BR`; a bare `BR` branches always
/// (equivalent to `BRnzp`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrFlags {
    pub n: bool,
    pub z: bool,
    pub p: bool,
}

impl BrFlags {
    pub fn new(n: bool, z: bool, p: bool) -> Self {
        Self { n, z, p }
    }

    /// Parse an uppercased mnemonic such as "BR", "BRN", "BRNZP".
    /// Returns `None` for anything that is not a BR variant.
    pub fn parse(upper: &str) -> Option<Self> {
        let suffix = upper.strip_prefix("BR")?;
        if suffix.is_empty() {
            return Some(Self::new(true, true, true));
        }

        let mut flags = Self::new(false, false, false);
        for ch in suffix.chars() {
            match ch {
                'N' => flags.n = true,
                'Z' => flags.z = true,
                'P' => flags.p = true,
                _ => return None,
            }
        }
        Some(flags)
    }

    /// The 3-bit field occupying bits [11:9] of a BR word: [n][z][p].
    pub fn bits(&self) -> u16 {
        ((self.n as u16) << 2) | ((self.z as u16) << 1) | (self.p as u16)
    }
}

impl std::fmt::Display for BrFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.n {
            f.write_str("n")?;
        }
        if self.z {
            f.write_str("z")?;
        }
        if self.p {
            f.write_str("p")?;
        }
        Ok(())
    }
}

impl TokenKind {
    pub fn is_instruction_or_directive(&self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            OpAdd
                | OpAnd
                | OpNot
                | OpBr(_)
                | OpJmp
                | OpJsr
                | OpJsrr
                | OpLd
                | OpLdi
                | OpLdr
                | OpLea
                | OpSt
                | OpSti
                | OpStr
                | OpTrap
                | OpRti
                | PseudoRet
                | PseudoGetc
                | PseudoOut
                | PseudoPuts
                | PseudoIn
                | PseudoPutsp
                | PseudoHalt
                | DirOrig
                | DirEnd
                | DirFill
                | DirBlkw
                | DirStringz
        )
    }
}

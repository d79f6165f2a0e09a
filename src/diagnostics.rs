//! Diagnostic reporting to the console.

use colored::Colorize;

use crate::error::AsmError;

/// Print one assembler diagnostic to stderr.
pub fn report(err: &AsmError) {
    eprintln!("{} {}", "error:".red().bold(), err);
}

/// Print a free-form error message (I/O failures and the like) to stderr.
pub fn error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message);
}

/// Print a warning to stderr.
pub fn warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message);
}

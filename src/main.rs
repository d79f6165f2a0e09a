use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use lc3_asm::diagnostics;
use lc3_asm::encoder::encode;
use lc3_asm::error::AsmError;
use lc3_asm::first_pass::first_pass;
use lc3_asm::lexer::tokenize;
use lc3_asm::obj;
use lc3_asm::parser::parse_lines;
use lc3_asm::validator::validate;

/// Two-pass assembler for the LC-3 educational computer.
#[derive(Parser)]
#[command(name = "lc3-asm", version, about)]
struct Args {
    /// LC-3 assembly source file; the object image is written next to it
    /// with an .obj extension.
    input: PathBuf,
}

// Exit codes: 0 = success, 1 = I/O failure, 2 = assembly diagnostics.
fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            diagnostics::error(&format!("{err:#}"));
            ExitCode::from(1)
        }
    }
}

fn run(args: &Args) -> anyhow::Result<bool> {
    let source = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    let lexed = tokenize(&source);
    let parsed = parse_lines(&lexed.tokens);
    let semantic_errors = validate(&parsed.lines);
    let first = first_pass(parsed.lines);
    let encoded = encode(&first);

    let mut errors: Vec<&AsmError> = lexed
        .errors
        .iter()
        .chain(&parsed.errors)
        .chain(&semantic_errors)
        .chain(&first.errors)
        .chain(&encoded.errors)
        .collect();
    errors.sort_by_key(|e| (e.span.line, e.span.col));

    if !errors.is_empty() {
        for err in &errors {
            diagnostics::report(err);
        }
        diagnostics::error(&format!(
            "{} error(s); no object file written",
            errors.len()
        ));
        return Ok(false);
    }

    first
        .symbol_table
        .write_listing(&mut std::io::stdout())
        .context("failed to write the symbol listing")?;

    let output = args.input.with_extension("obj");
    obj::write_file(&output, &encoded.segments)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "assembled {} -> {} ({} segment(s), {} words)",
        args.input.display(),
        output.display(),
        encoded.segments.len(),
        encoded
            .segments
            .iter()
            .map(|s| s.words.len())
            .sum::<usize>()
    );
    Ok(true)
}

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use lc3_vm::console::RawConsole;
use lc3_vm::vm::Vm;

/// Virtual machine for LC-3 object images.
#[derive(Parser)]
#[command(name = "lc3-vm", version, about)]
struct Args {
    /// Object image produced by lc3-asm.
    image: PathBuf,
}

// Exit codes: 0 = clean HALT, 1 = I/O failure.
fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // The raw-mode guard has been dropped by now; plain eprintln is
            // safe again.
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let segments = lc3_asm::obj::read_file(&args.image)
        .with_context(|| format!("failed to load {}", args.image.display()))?;

    let console = RawConsole::new().context("failed to put the terminal into raw mode")?;
    let mut vm = Vm::new(console);
    vm.load(&segments);
    vm.run().context("execution failed")?;
    Ok(())
}

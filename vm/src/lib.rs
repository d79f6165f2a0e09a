//! # LC-3 Virtual Machine
//!
//! Loads the segment-based object images produced by `lc3-asm` into a
//! 64 KiW address space and interprets them: eight general registers, PC,
//! one-hot N/Z/P condition codes, memory-mapped keyboard and display
//! registers (KBSR/KBDR/DSR/DDR), and in-VM servicing of the standard trap
//! vectors when no OS ROM is loaded.
//!
//! The interpreter is generic over a [`console::Console`], so it runs
//! against the real terminal in raw mode (`console::RawConsole`) or against
//! scripted byte buffers in tests (`console::ScriptedConsole`).
//!
//! ## Example
//!
//! ```rust,no_run
//! use lc3_vm::console::RawConsole;
//! use lc3_vm::vm::Vm;
//!
//! let segments = lc3_asm::obj::read_file("program.obj").unwrap();
//! let console = RawConsole::new().unwrap();
//! let mut vm = Vm::new(console);
//! vm.load(&segments);
//! vm.run().unwrap();
//! ```

pub mod console;
pub mod instruction;
pub mod vm;

//! Terminal access behind the `Console` trait.
//!
//! The interpreter only ever talks to a `Console`, so the real raw-mode
//! terminal and the scripted in-memory console used by the tests are
//! interchangeable. `RawConsole` owns the raw-mode switch through an RAII
//! guard: canonical mode comes back on drop, which covers early returns,
//! errors, and panics alike.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

pub trait Console {
    /// Non-blocking: the next pending key, if any.
    fn poll_key(&mut self) -> io::Result<Option<u8>>;
    /// Blocking: wait for one key.
    fn read_key(&mut self) -> io::Result<u8>;
    fn write_byte(&mut self, byte: u8) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// The real terminal, in raw no-echo mode for the lifetime of the value.
pub struct RawConsole {
    _raw: RawModeGuard,
    stdout: io::Stdout,
}

impl RawConsole {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            _raw: RawModeGuard::enable()?,
            stdout: io::stdout(),
        })
    }
}

/// Map a key event to the byte the program sees. Ctrl-C surfaces as an
/// `Interrupted` error so the run loop unwinds (and the guard restores the
/// terminal); keys with no byte representation are ignored.
fn key_to_byte(key: &KeyEvent) -> io::Result<Option<u8>> {
    if key.kind != KeyEventKind::Press {
        return Ok(None);
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Err(io::Error::new(io::ErrorKind::Interrupted, "interrupted"));
    }
    Ok(match key.code {
        KeyCode::Char(c) if c.is_ascii() => Some(c as u8),
        KeyCode::Enter => Some(b'\n'),
        KeyCode::Tab => Some(b'\t'),
        KeyCode::Backspace => Some(0x08),
        KeyCode::Esc => Some(0x1B),
        _ => None,
    })
}

impl Console for RawConsole {
    fn poll_key(&mut self) -> io::Result<Option<u8>> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if let Some(byte) = key_to_byte(&key)? {
                    return Ok(Some(byte));
                }
            }
        }
        Ok(None)
    }

    fn read_key(&mut self) -> io::Result<u8> {
        loop {
            if let Event::Key(key) = event::read()? {
                if let Some(byte) = key_to_byte(&key)? {
                    return Ok(byte);
                }
            }
        }
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        // Raw mode turns off output post-processing, so a bare LF would not
        // return the carriage.
        if byte == b'\n' {
            self.stdout.write_all(b"\r\n")
        } else {
            self.stdout.write_all(&[byte])
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
}

/// In-memory console: input from a queue, output into a buffer. Used by the
/// test suites and anywhere a VM runs headless.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

impl ScriptedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(input: &[u8]) -> Self {
        Self {
            input: input.iter().copied().collect(),
            output: Vec::new(),
        }
    }

    pub fn push_input(&mut self, bytes: &[u8]) {
        self.input.extend(bytes);
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl Console for ScriptedConsole {
    fn poll_key(&mut self) -> io::Result<Option<u8>> {
        Ok(self.input.pop_front())
    }

    fn read_key(&mut self) -> io::Result<u8> {
        self.input.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "scripted input exhausted")
        })
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.output.push(byte);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

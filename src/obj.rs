//! Object image reading and writing.
//!
//! An image is a big-endian stream of 16-bit words. Each segment is
//! serialized as its origin, its word count, and then that many content
//! words; segments repeat in program order. The explicit count is what makes
//! a multi-segment image self-describing — a bare `(origin, words...)`
//! stream has no way to mark where one segment ends and the next begins.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

/// A contiguous run of words with a fixed load address, produced by one
/// `.ORIG`/`.END` pair. The words occupy `[origin, origin + len)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub origin: u16,
    pub words: Vec<u16>,
}

impl Segment {
    pub fn new(origin: u16) -> Self {
        Self {
            origin,
            words: Vec::new(),
        }
    }

    /// Address the next emitted word will occupy.
    pub fn next_address(&self) -> u16 {
        self.origin.wrapping_add(self.words.len() as u16)
    }
}

#[derive(Debug, Error)]
pub enum ObjError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("truncated object image: segment at x{origin:04X} declares {declared} words")]
    Truncated { origin: u16, declared: u16 },
    #[error("segment at x{origin:04X} with {declared} words overruns the address space")]
    Overrun { origin: u16, declared: u16 },
}

pub fn write<W: Write>(writer: &mut W, segments: &[Segment]) -> io::Result<()> {
    for segment in segments {
        writer.write_u16::<BigEndian>(segment.origin)?;
        writer.write_u16::<BigEndian>(segment.words.len() as u16)?;
        for &word in &segment.words {
            writer.write_u16::<BigEndian>(word)?;
        }
    }
    Ok(())
}

pub fn read<R: Read>(reader: &mut R) -> Result<Vec<Segment>, ObjError> {
    let mut segments = Vec::new();

    loop {
        // A clean image ends exactly on a segment boundary.
        let mut header = [0u8; 2];
        match reader.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        let origin = u16::from_be_bytes(header);
        let declared = reader.read_u16::<BigEndian>()?;

        if origin as u32 + declared as u32 > 0x10000 {
            return Err(ObjError::Overrun { origin, declared });
        }

        let mut words = Vec::with_capacity(declared as usize);
        for _ in 0..declared {
            match reader.read_u16::<BigEndian>() {
                Ok(word) => words.push(word),
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return Err(ObjError::Truncated { origin, declared });
                }
                Err(e) => return Err(e.into()),
            }
        }

        segments.push(Segment { origin, words });
    }

    Ok(segments)
}

pub fn write_file<P: AsRef<Path>>(path: P, segments: &[Segment]) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write(&mut writer, segments)?;
    writer.flush()
}

pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<Segment>, ObjError> {
    read(&mut BufReader::new(File::open(path)?))
}

//! Stream cursor: the thin wrapper the lexer drives over the external byte
//! stream (spec §4.1). Owns exactly one byte of lookahead so `peek()` never
//! touches the underlying reader.

use std::io::{self, Read, Seek, SeekFrom};

/// Any seekable, forward-readable byte source can back a program: a file, a
/// `Cursor<Vec<u8>>` in tests, a pipe that supports seeking.
pub trait ByteSource: Read + Seek {}
impl<T: Read + Seek> ByteSource for T {}

pub struct StreamCursor<R> {
    reader: R,
    offset: u64,
    lookahead: u8,
    eof: bool,
}

impl<R: ByteSource> StreamCursor<R> {
    pub fn new(mut reader: R) -> io::Result<Self> {
        let mut buf = [0u8; 1];
        let (lookahead, eof) = match reader.read(&mut buf)? {
            0 => (0, true),
            _ => (buf[0], false),
        };
        Ok(Self {
            reader,
            offset: 0,
            lookahead,
            eof,
        })
    }

    /// The buffered lookahead byte. Latched at the last byte once EOF is
    /// reached, per spec §4.1.
    pub fn peek(&self) -> u8 {
        self.lookahead
    }

    pub fn at_eof(&self) -> bool {
        self.eof
    }

    /// Offset of the byte currently buffered as lookahead (the next byte
    /// that will be consumed).
    pub fn tell(&self) -> u64 {
        self.offset
    }

    /// Read one more byte into the lookahead buffer. No-op at EOF.
    pub fn advance(&mut self) -> io::Result<()> {
        if self.eof {
            return Ok(());
        }
        self.offset += 1;
        let mut buf = [0u8; 1];
        match self.reader.read(&mut buf)? {
            0 => self.eof = true,
            _ => self.lookahead = buf[0],
        }
        Ok(())
    }

    /// Reposition the stream at `offset` and reload the lookahead byte.
    pub fn seek(&mut self, offset: u64) -> io::Result<()> {
        self.reader.seek(SeekFrom::Start(offset))?;
        self.offset = offset;
        let mut buf = [0u8; 1];
        match self.reader.read(&mut buf)? {
            0 => {
                self.eof = true;
                self.lookahead = 0;
            }
            _ => {
                self.eof = false;
                self.lookahead = buf[0];
            }
        }
        Ok(())
    }
}

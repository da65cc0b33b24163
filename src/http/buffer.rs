//! Fixed-capacity read and write buffers.
//!
//! The read buffer carries three cursors that the line splitter and the
//! request parser share:
//!
//! ```text
//!  0          start_line     checked_idx        read_idx       capacity
//!  |  consumed  |  current line  |   unscanned      |    spare     |
//! ```
//!
//! `start_line <= checked_idx <= read_idx <= capacity` holds at all times.

use std::fmt;

use crate::http::error::BufferFull;

/// Default read buffer capacity.
pub const READ_BUFFER_SIZE: usize = 2048;

/// Default write buffer capacity.
pub const WRITE_BUFFER_SIZE: usize = 1024;

/// Result of one line-splitter scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStatus {
    /// A CRLF-terminated line is ready at `start_line`.
    Complete,
    /// Ran out of bytes before a CRLF; scan resumes at `checked_idx`.
    Incomplete,
    /// Bare LF, or CR followed by something other than LF.
    Malformed,
}

pub struct ReadBuffer {
    buf: Box<[u8]>,
    read_idx: usize,
    checked_idx: usize,
    start_line: usize,
}

impl ReadBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity].into_boxed_slice(),
            read_idx: 0,
            checked_idx: 0,
            start_line: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Number of bytes received so far.
    pub fn len(&self) -> usize {
        self.read_idx
    }

    pub fn is_empty(&self) -> bool {
        self.read_idx == 0
    }

    pub fn is_full(&self) -> bool {
        self.read_idx == self.buf.len()
    }

    pub fn checked_idx(&self) -> usize {
        self.checked_idx
    }

    pub fn start_line(&self) -> usize {
        self.start_line
    }

    /// Everything received so far, including rewritten line terminators.
    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.read_idx]
    }

    /// Unfilled tail the socket can read into.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.read_idx..]
    }

    /// Commits `n` bytes previously written into [`spare_mut`](Self::spare_mut).
    pub fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.buf.len() - self.read_idx);
        self.read_idx = (self.read_idx + n).min(self.buf.len());
    }

    /// Copies as much of `data` as fits and returns how many bytes were taken.
    pub fn extend_from_slice(&mut self, data: &[u8]) -> usize {
        let spare = self.spare_mut();
        let n = data.len().min(spare.len());
        spare[..n].copy_from_slice(&data[..n]);
        self.advance(n);
        n
    }

    /// Scans forward from `checked_idx` for a CRLF.
    ///
    /// On [`LineStatus::Complete`] both delimiter bytes are overwritten with
    /// NUL and `checked_idx` points just past them. Bytes before `checked_idx`
    /// are never examined again, so the scan may be resumed after every read.
    pub fn parse_line(&mut self) -> LineStatus {
        while self.checked_idx < self.read_idx {
            match self.buf[self.checked_idx] {
                b'\r' => {
                    if self.checked_idx + 1 == self.read_idx {
                        // the LF may still be on the wire
                        return LineStatus::Incomplete;
                    }
                    if self.buf[self.checked_idx + 1] == b'\n' {
                        self.buf[self.checked_idx] = 0;
                        self.buf[self.checked_idx + 1] = 0;
                        self.checked_idx += 2;
                        return LineStatus::Complete;
                    }
                    return LineStatus::Malformed;
                }
                b'\n' => {
                    if self.checked_idx > self.start_line && self.buf[self.checked_idx - 1] == b'\r' {
                        self.buf[self.checked_idx - 1] = 0;
                        self.buf[self.checked_idx] = 0;
                        self.checked_idx += 1;
                        return LineStatus::Complete;
                    }
                    return LineStatus::Malformed;
                }
                _ => self.checked_idx += 1,
            }
        }
        LineStatus::Incomplete
    }

    /// Takes the line completed by the last [`parse_line`](Self::parse_line)
    /// call, without its terminator, and moves `start_line` past it.
    pub fn take_line(&mut self) -> &[u8] {
        let start = self.start_line;
        let end = self.checked_idx.saturating_sub(2).max(start);
        self.start_line = self.checked_idx;
        &self.buf[start..end]
    }

    /// Bytes after the current line start, the candidate message body.
    pub fn unparsed(&self) -> &[u8] {
        &self.buf[self.start_line..self.read_idx]
    }

    /// Room left for a body that starts at `start_line`.
    pub fn room_from_line(&self) -> usize {
        self.buf.len() - self.start_line
    }

    /// Takes exactly `n` body bytes starting at `start_line`.
    pub fn take_body(&mut self, n: usize) -> &[u8] {
        let start = self.start_line;
        let end = (start + n).min(self.read_idx);
        self.start_line = end;
        self.checked_idx = self.checked_idx.max(end);
        &self.buf[start..end]
    }

    /// Logically empties the buffer.
    pub fn clear(&mut self) {
        self.buf.fill(0);
        self.read_idx = 0;
        self.checked_idx = 0;
        self.start_line = 0;
    }
}

impl fmt::Debug for ReadBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadBuffer")
            .field("capacity", &self.buf.len())
            .field("read_idx", &self.read_idx)
            .field("checked_idx", &self.checked_idx)
            .field("start_line", &self.start_line)
            .finish()
    }
}

/// Response head buffer.
///
/// One byte of capacity is always kept free, so at most `capacity - 1` bytes
/// are ever composed.
pub struct WriteBuffer {
    buf: Box<[u8]>,
    write_idx: usize,
}

impl WriteBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity].into_boxed_slice(),
            write_idx: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.write_idx
    }

    pub fn is_empty(&self) -> bool {
        self.write_idx == 0
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(1 + self.write_idx)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.write_idx]
    }

    /// Appends all of `bytes` or nothing.
    pub fn push(&mut self, bytes: &[u8]) -> Result<(), BufferFull> {
        if bytes.len() > self.remaining() {
            return Err(BufferFull { capacity: self.buf.len() });
        }
        self.buf[self.write_idx..self.write_idx + bytes.len()].copy_from_slice(bytes);
        self.write_idx += bytes.len();
        Ok(())
    }

    /// Formats `args` into the buffer, rolling back on overflow.
    pub fn push_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<(), BufferFull> {
        let mark = self.write_idx;
        fmt::Write::write_fmt(self, args).map_err(|_| {
            self.write_idx = mark;
            BufferFull { capacity: self.buf.len() }
        })
    }

    pub fn clear(&mut self) {
        self.buf.fill(0);
        self.write_idx = 0;
    }
}

impl fmt::Write for WriteBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

impl fmt::Debug for WriteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteBuffer")
            .field("capacity", &self.buf.len())
            .field("write_idx", &self.write_idx)
            .finish()
    }
}

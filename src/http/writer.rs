//! Scatter-gather response writer.
//!
//! A response is at most two segments: the head (and any inline body) in
//! the connection's write buffer, then the mapped file. Both are derived
//! from a single `bytes_sent` counter, so a write that stops at any byte
//! resumes from exactly that byte on the next attempt.

use std::io::{self, IoSlice, Write};

use crate::http::mapping::FileMapping;

/// Outcome of one writable event.
#[derive(Debug)]
pub enum WriteStatus {
    /// Every byte has been sent.
    Complete,
    /// The socket is full; wait for the next writable event.
    WouldBlock,
    /// The socket failed. The body mapping has already been released.
    Failed(io::Error),
}

#[derive(Debug, Default)]
pub struct ResponseWriter {
    head_len: usize,
    bytes_sent: usize,
    body: Option<FileMapping>,
}

impl ResponseWriter {
    /// A writer with nothing to send.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a response of `head_len` buffered bytes followed by `body`.
    pub fn start(&mut self, head_len: usize, body: Option<FileMapping>) {
        self.head_len = head_len;
        self.bytes_sent = 0;
        self.body = body;
    }

    fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, |b| b.len())
    }

    pub fn bytes_to_send(&self) -> usize {
        // the body may already be released while bytes_sent still counts it
        (self.head_len + self.body_len()).saturating_sub(self.bytes_sent)
    }

    pub fn bytes_sent(&self) -> usize {
        self.bytes_sent
    }

    pub fn is_idle(&self) -> bool {
        self.bytes_to_send() == 0
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Unsent part of the head, given the buffer it lives in.
    pub fn remaining_head<'a>(&self, head: &'a [u8]) -> &'a [u8] {
        &head[self.bytes_sent.min(self.head_len)..self.head_len]
    }

    /// Unsent part of the mapped file.
    pub fn remaining_body(&self) -> &[u8] {
        match &self.body {
            Some(body) => &body[self.bytes_sent.saturating_sub(self.head_len).min(body.len())..],
            None => &[],
        }
    }

    /// Records `n` more bytes as sent.
    pub fn advance(&mut self, n: usize) {
        self.bytes_sent = (self.bytes_sent + n).min(self.head_len + self.body_len());
    }

    /// Drops the body mapping, if any.
    pub fn release(&mut self) {
        self.body = None;
    }

    /// Clears all progress and releases the body.
    pub fn reset(&mut self) {
        self.head_len = 0;
        self.bytes_sent = 0;
        self.body = None;
    }

    /// Writes as much as `io` accepts.
    ///
    /// `head` is the write buffer holding the first `head_len` bytes. On
    /// completion the body is released; the caller decides what happens to
    /// the connection.
    pub fn write_to<W: Write>(&mut self, io: &mut W, head: &[u8]) -> WriteStatus {
        loop {
            if self.is_idle() {
                self.release();
                return WriteStatus::Complete;
            }

            let result = {
                let iov = [
                    IoSlice::new(self.remaining_head(head)),
                    IoSlice::new(self.remaining_body()),
                ];
                io.write_vectored(&iov)
            };

            match result {
                Ok(0) => {
                    self.release();
                    return WriteStatus::Failed(io::ErrorKind::WriteZero.into());
                }
                Ok(n) => {
                    tracing::trace!(written = n, "writev");
                    self.advance(n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return WriteStatus::WouldBlock,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.release();
                    return WriteStatus::Failed(e);
                }
            }
        }
    }
}

use std::io::{self, IoSlice, Read, Write};

use tokio::net::TcpStream;

/// Non-blocking `Read`/`Write` view of a tokio [`TcpStream`].
///
/// Every call is a single `try_*` attempt and reports
/// [`io::ErrorKind::WouldBlock`] when the socket is not ready. Tokio clears
/// the cached readiness on `WouldBlock`, so waiting on
/// [`readable`](TcpStream::readable) / [`writable`](TcpStream::writable)
/// afterwards behaves like an edge-triggered notification.
#[derive(Debug)]
pub struct Socket {
    stream: TcpStream,
}

impl Socket {
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    pub fn stream(&self) -> &TcpStream {
        &self.stream
    }
}

impl Read for Socket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.try_read(buf)
    }
}

impl Write for Socket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.try_write(buf)
    }

    fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
        self.stream.try_write_vectored(bufs)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

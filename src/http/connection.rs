use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::http::buffer::{READ_BUFFER_SIZE, ReadBuffer, WRITE_BUFFER_SIZE, WriteBuffer};
use crate::http::error::RequestError;
use crate::http::parser::{Parse, RequestParser};
use crate::http::request::Request;
use crate::http::resolver::{Resolver, StaticFile};
use crate::http::response;
use crate::http::writer::{ResponseWriter, WriteStatus};

/// Readiness the connection wants next.
///
/// Every entry point returns one of these; the reactor re-arms exactly that
/// interest, or drops the socket on `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Reading,
    Writing,
    Closed,
}

/// Per-socket protocol state.
///
/// `S` is a non-blocking byte stream: reads and writes return
/// [`io::ErrorKind::WouldBlock`] instead of waiting.
pub struct Connection<S> {
    socket: S,
    peer: SocketAddr,
    resolver: Arc<Resolver>,
    read: ReadBuffer,
    write: WriteBuffer,
    parser: RequestParser,
    writer: ResponseWriter,
}

impl<S: Read + Write> Connection<S> {
    pub fn new(socket: S, peer: SocketAddr, resolver: Arc<Resolver>) -> Self {
        Self::with_capacity(socket, peer, resolver, READ_BUFFER_SIZE, WRITE_BUFFER_SIZE)
    }

    pub fn with_capacity(
        socket: S,
        peer: SocketAddr,
        resolver: Arc<Resolver>,
        read_capacity: usize,
        write_capacity: usize,
    ) -> Self {
        Self {
            socket,
            peer,
            resolver,
            read: ReadBuffer::new(read_capacity),
            write: WriteBuffer::new(write_capacity),
            parser: RequestParser::new(),
            writer: ResponseWriter::new(),
        }
    }

    pub fn socket(&self) -> &S {
        &self.socket
    }

    pub fn socket_mut(&mut self) -> &mut S {
        &mut self.socket
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn read_buffer(&self) -> &ReadBuffer {
        &self.read
    }

    pub fn write_buffer(&self) -> &WriteBuffer {
        &self.write
    }

    pub fn parser(&self) -> &RequestParser {
        &self.parser
    }

    pub fn request(&self) -> &Request {
        self.parser.request()
    }

    pub fn writer(&self) -> &ResponseWriter {
        &self.writer
    }

    /// Readable event: drain the socket, then parse what arrived.
    pub fn on_readable(&mut self) -> ConnectionState {
        if !self.read_once() {
            return ConnectionState::Closed;
        }
        self.process()
    }

    /// Reads until the socket would block.
    ///
    /// Returns false on end of stream, on a socket error, or when the read
    /// buffer was already full before reading.
    pub fn read_once(&mut self) -> bool {
        if self.read.is_full() {
            return false;
        }

        loop {
            let spare = self.read.spare_mut();
            if spare.is_empty() {
                return true;
            }
            match self.socket.read(spare) {
                Ok(0) => {
                    debug!(peer = %self.peer, "Peer closed connection");
                    return false;
                }
                Ok(n) => self.read.advance(n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return true,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!(peer = %self.peer, error = %e, "Read failed");
                    return false;
                }
            }
        }
    }

    /// Parses the buffered bytes and, once a request is complete, resolves
    /// it and prepares the response.
    pub fn process(&mut self) -> ConnectionState {
        let outcome = match self.parser.process(&mut self.read) {
            Ok(Parse::NeedMoreData) if self.read.is_full() => {
                warn!(
                    peer = %self.peer,
                    capacity = self.read.capacity(),
                    "Request does not fit in read buffer"
                );
                Err(RequestError::BadRequest)
            }
            Ok(Parse::NeedMoreData) => return ConnectionState::Reading,
            Ok(Parse::Ready) => self.resolver.resolve(self.parser.request_mut()),
            Err(e) => Err(e),
        };

        if self.prepare_response(outcome) {
            ConnectionState::Writing
        } else {
            ConnectionState::Closed
        }
    }

    fn prepare_response(&mut self, outcome: Result<StaticFile, RequestError>) -> bool {
        let keep_alive = self.parser.request().keep_alive;
        self.write.clear();

        let status = match response::write_response(&mut self.write, &outcome, keep_alive) {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(peer = %self.peer, error = %e, "Cannot build response");
                return false;
            }
        };

        if let Err(e) = &outcome {
            debug!(peer = %self.peer, error = %e, "Request failed");
        }

        let body = outcome.ok().and_then(StaticFile::into_mapping);
        info!(
            peer = %self.peer,
            method = ?self.parser.request().method,
            url = %self.parser.request().url,
            status = status.as_u16(),
            bytes = self.write.len() + body.as_ref().map_or(0, |b| b.len()),
            "Response ready"
        );
        self.writer.start(self.write.len(), body);
        true
    }

    /// Writable event: push the pending response out.
    ///
    /// On completion a keep-alive connection is reset for the next request;
    /// otherwise it asks to be closed.
    pub fn on_writable(&mut self) -> ConnectionState {
        if self.writer.is_idle() {
            self.reset();
            return ConnectionState::Reading;
        }

        match self.writer.write_to(&mut self.socket, self.write.as_bytes()) {
            WriteStatus::WouldBlock => ConnectionState::Writing,
            WriteStatus::Failed(e) => {
                debug!(peer = %self.peer, error = %e, "Write failed");
                ConnectionState::Closed
            }
            WriteStatus::Complete => {
                if self.parser.request().keep_alive {
                    self.reset();
                    ConnectionState::Reading
                } else {
                    ConnectionState::Closed
                }
            }
        }
    }

    /// Returns every field to its initial value, keeping the socket.
    pub fn reset(&mut self) {
        self.read.clear();
        self.write.clear();
        self.parser.reset();
        self.writer.reset();
    }

    /// Releases the in-flight response. Call before dropping the socket.
    pub fn close(&mut self) {
        self.writer.release();
        info!(peer = %self.peer, "Connection closed");
    }
}

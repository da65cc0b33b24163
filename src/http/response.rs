use std::fmt::Display;

use crate::http::buffer::WriteBuffer;
use crate::http::error::{BufferFull, RequestError};
use crate::http::resolver::StaticFile;

const HTTP_VERSION: &str = "HTTP/1.1";

pub const FORBIDDEN_BODY: &str = "You do not have permission to get file from this server.\n";
pub const NOT_FOUND_BODY: &str = "The requested file was not found on this server.\n";
pub const INTERNAL_ERROR_BODY: &str = "There was an unusual problem serving the request file.\n";

/// Inline body for a zero-length file.
pub const EMPTY_PAGE: &str = "<html><body></body></html>";

/// HTTP status codes the server answers with.
///
/// - `Ok` (200): the file is sent
/// - `Forbidden` (403): the file is not world-readable
/// - `NotFound` (404): missing file, or a request we could not make sense of
/// - `InternalServerError` (500): something broke on our side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok,
    Forbidden,
    NotFound,
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// ```
    /// # use tinyweb::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
        }
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    /// Canonical status for a failed request. Bad requests are answered
    /// with 404 as well.
    pub fn for_error(err: RequestError) -> Self {
        match err {
            RequestError::BadRequest | RequestError::NoResource => StatusCode::NotFound,
            RequestError::Forbidden => StatusCode::Forbidden,
            RequestError::InternalError => StatusCode::InternalServerError,
        }
    }

    /// Fixed inline body sent with an error status.
    pub fn error_body(&self) -> &'static str {
        match self {
            StatusCode::Ok => "",
            StatusCode::Forbidden => FORBIDDEN_BODY,
            StatusCode::NotFound => NOT_FOUND_BODY,
            StatusCode::InternalServerError => INTERNAL_ERROR_BODY,
        }
    }
}

/// Appends response fields to a [`WriteBuffer`].
///
/// Each call either appends its whole field or fails with [`BufferFull`]
/// leaving the buffer as it was.
///
/// # Example
///
/// ```
/// # use tinyweb::http::buffer::WriteBuffer;
/// # use tinyweb::http::response::{ResponseBuilder, StatusCode};
/// let mut buf = WriteBuffer::new(256);
/// ResponseBuilder::new(&mut buf)
///     .status_line(StatusCode::Ok).unwrap()
///     .headers(2, false).unwrap()
///     .body(b"hi").unwrap();
/// assert!(buf.as_bytes().starts_with(b"HTTP/1.1 200 OK\r\n"));
/// ```
pub struct ResponseBuilder<'a> {
    buf: &'a mut WriteBuffer,
}

impl<'a> ResponseBuilder<'a> {
    pub fn new(buf: &'a mut WriteBuffer) -> Self {
        Self { buf }
    }

    pub fn status_line(&mut self, status: StatusCode) -> Result<&mut Self, BufferFull> {
        self.buf.push_fmt(format_args!(
            "{} {} {}\r\n",
            HTTP_VERSION,
            status.as_u16(),
            status.reason_phrase()
        ))?;
        Ok(self)
    }

    pub fn header(&mut self, name: &str, value: impl Display) -> Result<&mut Self, BufferFull> {
        self.buf.push_fmt(format_args!("{name}: {value}\r\n"))?;
        Ok(self)
    }

    /// Content-Length, Connection and the blank line ending the head.
    pub fn headers(&mut self, content_len: usize, keep_alive: bool) -> Result<&mut Self, BufferFull> {
        self.header("Content-Length", content_len)?
            .header("Connection", if keep_alive { "keep-alive" } else { "close" })?
            .blank_line()
    }

    pub fn blank_line(&mut self) -> Result<&mut Self, BufferFull> {
        self.buf.push(b"\r\n")?;
        Ok(self)
    }

    pub fn body(&mut self, body: &[u8]) -> Result<&mut Self, BufferFull> {
        self.buf.push(body)?;
        Ok(self)
    }
}

/// Writes the response head for `outcome`, plus the inline body when there
/// is no file to send. Returns the status written.
///
/// A non-empty file contributes only its length; its bytes go out from the
/// mapping.
pub fn write_response(
    buf: &mut WriteBuffer,
    outcome: &Result<StaticFile, RequestError>,
    keep_alive: bool,
) -> Result<StatusCode, BufferFull> {
    match outcome {
        Ok(file) if file.len > 0 => {
            ResponseBuilder::new(buf)
                .status_line(StatusCode::Ok)?
                .headers(file.len, keep_alive)?;
            Ok(StatusCode::Ok)
        }
        Ok(_) => {
            ResponseBuilder::new(buf)
                .status_line(StatusCode::Ok)?
                .headers(EMPTY_PAGE.len(), keep_alive)?
                .body(EMPTY_PAGE.as_bytes())?;
            Ok(StatusCode::Ok)
        }
        Err(err) => {
            let status = StatusCode::for_error(*err);
            write_error(buf, status, keep_alive)?;
            Ok(status)
        }
    }
}

/// Writes a complete error response with its fixed inline body.
pub fn write_error(buf: &mut WriteBuffer, status: StatusCode, keep_alive: bool) -> Result<(), BufferFull> {
    let body = status.error_body();
    ResponseBuilder::new(buf)
        .status_line(status)?
        .headers(body.len(), keep_alive)?
        .body(body.as_bytes())?;
    Ok(())
}

use bytes::Bytes;

use crate::http::buffer::{LineStatus, ReadBuffer};
use crate::http::error::RequestError;
use crate::http::request::{Method, Request};

/// Page served for a bare `/`.
pub const LANDING_PAGE: &str = "/judge.html";

/// Longest accepted request target, in bytes.
pub const MAX_URL_LEN: usize = 200;

const HTTP_VERSION: &[u8] = b"HTTP/1.1";

/// Stage of the request state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckState {
    #[default]
    RequestLine,
    Header,
    Content,
}

/// Non-error outcome of a parsing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parse {
    /// The buffered bytes do not hold a full request yet.
    NeedMoreData,
    /// A complete request is available through [`RequestParser::request`].
    Ready,
}

/// Result of feeding one line or one body chunk to a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Ready,
}

#[derive(Debug, Default)]
pub struct RequestParser {
    state: CheckState,
    request: Request,
}

impl RequestParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CheckState {
        self.state
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    pub fn reset(&mut self) {
        self.state = CheckState::RequestLine;
        self.request = Request::default();
    }

    /// Drives the line splitter over `buf` until a request is complete, more
    /// bytes are needed, or the input is rejected.
    ///
    /// Bytes after a complete request are left untouched.
    pub fn process(&mut self, buf: &mut ReadBuffer) -> Result<Parse, RequestError> {
        loop {
            if self.state == CheckState::Content {
                let needed = self.request.content_length;
                if buf.unparsed().len() < needed {
                    return Ok(Parse::NeedMoreData);
                }
                let body = buf.take_body(needed);
                return match self.feed_content(body)? {
                    Step::Ready => Ok(Parse::Ready),
                    Step::Continue => Err(RequestError::InternalError),
                };
            }

            match buf.parse_line() {
                LineStatus::Complete => {}
                LineStatus::Incomplete => return Ok(Parse::NeedMoreData),
                LineStatus::Malformed => return Err(RequestError::BadRequest),
            }

            let line = buf.take_line();
            tracing::debug!(line = %String::from_utf8_lossy(line), "request line");

            if self.feed_line(line)? == Step::Ready {
                return Ok(Parse::Ready);
            }

            if self.state == CheckState::Content && self.request.content_length > buf.room_from_line() {
                tracing::warn!(
                    content_length = self.request.content_length,
                    room = buf.room_from_line(),
                    "Body cannot fit in read buffer"
                );
                return Err(RequestError::BadRequest);
            }
        }
    }

    /// Feeds one complete line (terminator stripped) to the current state.
    pub fn feed_line(&mut self, line: &[u8]) -> Result<Step, RequestError> {
        match self.state {
            CheckState::RequestLine => {
                self.parse_request_line(line)?;
                self.state = CheckState::Header;
                Ok(Step::Continue)
            }
            CheckState::Header => Ok(self.parse_header(line)),
            CheckState::Content => Err(RequestError::InternalError),
        }
    }

    /// Feeds the message body to the `Content` state.
    ///
    /// `body` must be at least `content_length` bytes long.
    pub fn feed_content(&mut self, body: &[u8]) -> Result<Step, RequestError> {
        if self.state != CheckState::Content {
            return Err(RequestError::InternalError);
        }
        let needed = self.request.content_length;
        if body.len() < needed {
            return Ok(Step::Continue);
        }
        self.request.body = Bytes::copy_from_slice(&body[..needed]);
        Ok(Step::Ready)
    }

    fn parse_request_line(&mut self, line: &[u8]) -> Result<(), RequestError> {
        let (method, rest) = split_token(line).ok_or(RequestError::BadRequest)?;
        let method = Method::from_bytes(method).ok_or(RequestError::BadRequest)?;

        let (url, version) = split_token(rest).ok_or(RequestError::BadRequest)?;
        if !version.eq_ignore_ascii_case(HTTP_VERSION) {
            return Err(RequestError::BadRequest);
        }

        let url = normalize_url(url).ok_or(RequestError::BadRequest)?;
        let url = std::str::from_utf8(url).map_err(|_| RequestError::BadRequest)?;
        if url.len() > MAX_URL_LEN {
            return Err(RequestError::BadRequest);
        }

        self.request.method = method;
        self.request.url = if url == "/" {
            LANDING_PAGE.to_string()
        } else {
            url.to_string()
        };
        self.request.version = String::from_utf8_lossy(version).into_owned();
        Ok(())
    }

    fn parse_header(&mut self, line: &[u8]) -> Step {
        if line.is_empty() {
            if self.request.has_body() {
                self.state = CheckState::Content;
                return Step::Continue;
            }
            return Step::Ready;
        }

        if let Some(value) = header_value(line, b"Connection:") {
            if value.eq_ignore_ascii_case(b"keep-alive") {
                self.request.keep_alive = true;
            }
        } else if let Some(value) = header_value(line, b"Content-Length:") {
            self.request.content_length = parse_decimal(value);
        } else if let Some(value) = header_value(line, b"Host:") {
            self.request.host = Some(String::from_utf8_lossy(value).into_owned());
        } else {
            tracing::trace!(header = %String::from_utf8_lossy(line), "Ignoring header");
        }
        Step::Continue
    }
}

fn is_blank(b: &u8) -> bool {
    *b == b' ' || *b == b'\t'
}

fn skip_blanks(s: &[u8]) -> &[u8] {
    let n = s.iter().take_while(|b| is_blank(b)).count();
    &s[n..]
}

/// Splits at the first space or tab run: `("GET", "/ HTTP/1.1")`.
fn split_token(s: &[u8]) -> Option<(&[u8], &[u8])> {
    let at = s.iter().position(is_blank)?;
    Some((&s[..at], skip_blanks(&s[at..])))
}

/// Strips an absolute-form scheme and authority down to the path.
fn normalize_url(url: &[u8]) -> Option<&[u8]> {
    let mut url = url;
    for scheme in [&b"http://"[..], &b"https://"[..]] {
        if url.len() >= scheme.len() && url[..scheme.len()].eq_ignore_ascii_case(scheme) {
            let rest = &url[scheme.len()..];
            url = &rest[rest.iter().position(|&b| b == b'/')?..];
        }
    }
    (url.first() == Some(&b'/')).then_some(url)
}

fn header_value<'a>(line: &'a [u8], name: &[u8]) -> Option<&'a [u8]> {
    if line.len() >= name.len() && line[..name.len()].eq_ignore_ascii_case(name) {
        Some(skip_blanks(&line[name.len()..]))
    } else {
        None
    }
}

/// Leading decimal digits as a number, 0 when there are none.
fn parse_decimal(value: &[u8]) -> usize {
    value
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0usize, |n, &d| n.saturating_mul(10).saturating_add(usize::from(d - b'0')))
}

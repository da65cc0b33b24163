use bytes::Bytes;

/// HTTP request methods accepted by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// GET - Retrieve a resource
    #[default]
    GET,
    /// POST - Submit the login or registration form
    POST,
}

impl Method {
    /// Parses a method token, ignoring ASCII case.
    ///
    /// ```
    /// # use tinyweb::http::request::Method;
    /// assert_eq!(Method::from_bytes(b"get"), Some(Method::GET));
    /// assert_eq!(Method::from_bytes(b"PUT"), None);
    /// ```
    pub fn from_bytes(token: &[u8]) -> Option<Self> {
        if token.eq_ignore_ascii_case(b"GET") {
            Some(Method::GET)
        } else if token.eq_ignore_ascii_case(b"POST") {
            Some(Method::POST)
        } else {
            None
        }
    }
}

/// Request fields accumulated while the parser walks the message.
///
/// A fresh value is the state of a connection that has not seen a byte yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    /// The HTTP method
    pub method: Method,
    /// Normalized request target, always starting with `/` once parsed.
    /// The resolver may rewrite it.
    pub url: String,
    /// Version token as sent, e.g. "HTTP/1.1"
    pub version: String,
    /// Value of the Host header
    pub host: Option<String>,
    /// Value of the Content-Length header, 0 when absent
    pub content_length: usize,
    /// Whether the client sent `Connection: keep-alive`
    pub keep_alive: bool,
    /// Form body for POST requests
    pub body: Bytes,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when a message body is expected after the headers.
    pub fn has_body(&self) -> bool {
        self.content_length > 0
    }
}

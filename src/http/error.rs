use thiserror::Error;

/// Why a request could not be turned into a file response.
///
/// Every variant maps to exactly one canonical error response, see
/// [`StatusCode::for_error`](crate::http::response::StatusCode::for_error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Malformed request line, header or form body, or an unsupported
    /// method or version.
    #[error("bad request")]
    BadRequest,
    /// The resource exists but is not world-readable.
    #[error("forbidden")]
    Forbidden,
    /// The resource does not exist.
    #[error("no such resource")]
    NoResource,
    /// Something on our side went wrong (mapping failed, impossible state).
    #[error("internal error")]
    InternalError,
}

/// The write buffer cannot hold the next response field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("write buffer full ({capacity} bytes)")]
pub struct BufferFull {
    pub capacity: usize,
}

//! Reactor side: accepting sockets and driving each [`Connection`].
//!
//! [`Connection`]: crate::http::Connection

pub mod listener;
pub mod socket;

pub use socket::Socket;

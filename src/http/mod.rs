//! HTTP/1.1 protocol engine.
//!
//! This module turns inbound bytes into a parsed request, resolves the
//! request to a file under the document root, and streams the response back
//! from a memory mapping.
//!
//! # Architecture
//!
//! - **`buffer`**: fixed-capacity read/write buffers and the CRLF line splitter
//! - **`parser`**: the request-line / header / content state machine
//! - **`request`**: method and the request accumulator
//! - **`resolver`**: routing table, login/registration flow, file lookup
//! - **`mapping`**: read-only file mapping released on drop
//! - **`response`**: status codes and the response head builder
//! - **`writer`**: scatter-gather writes resumable at any byte
//! - **`connection`**: per-socket aggregate driven by the reactor
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← drain socket, parse; NeedMoreData stays here
//!        └──────┬──────┘
//!               │ request complete (or rejected)
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← resolve, build head, map file
//!        └──────┬───────────┘
//!               │ response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← writev until done; WouldBlock stays here
//!        └──────┬───────────┘
//!               │ response sent
//!               ├─ Keep-Alive → reset → Reading
//!               └─ Close → Closed
//! ```

pub mod buffer;
pub mod connection;
pub mod error;
pub mod mapping;
pub mod parser;
pub mod request;
pub mod resolver;
pub mod response;
pub mod writer;

pub use connection::{Connection, ConnectionState};
pub use error::{BufferFull, RequestError};

//! Tinyweb - event-driven static file server
//!
//! Core library for the HTTP/1.1 connection engine and the credential store
//! behind its login pages.

pub mod config;
pub mod http;
pub mod server;
pub mod users;

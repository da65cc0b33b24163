//! Credential store for the login and registration forms
//!
//! The in-memory table is shared by every connection and guarded by a single
//! lock. Registrations are persisted through a [`UserDatabase`] while that
//! lock is held.

pub mod database;
pub mod store;

pub use database::{UserDatabase, UserFile};
pub use store::UserStore;

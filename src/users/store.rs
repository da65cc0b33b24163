use std::collections::HashMap;
use std::fmt;

use anyhow::Result;
use parking_lot::Mutex;

use crate::users::database::UserDatabase;

/// Username to password table shared by all connections.
pub struct UserStore {
    users: Mutex<HashMap<String, String>>,
    db: Box<dyn UserDatabase>,
}

impl UserStore {
    /// Creates an empty store persisting to `db`.
    pub fn new(db: Box<dyn UserDatabase>) -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            db,
        }
    }

    /// Creates a store preloaded with everything `db` holds.
    pub fn load(db: Box<dyn UserDatabase>) -> Result<Self> {
        let users = db.load_users()?.into_iter().collect();
        Ok(Self {
            users: Mutex::new(users),
            db,
        })
    }

    pub fn lookup(&self, name: &str) -> Option<String> {
        self.users.lock().get(name).cloned()
    }

    /// True when `name` exists and its password matches exactly.
    pub fn verify(&self, name: &str, passwd: &str) -> bool {
        self.users.lock().get(name).is_some_and(|p| p == passwd)
    }

    /// Registers `name` unless it is already taken.
    ///
    /// Returns `Ok(false)` for a taken name without touching the database,
    /// `Ok(true)` once the account is persisted and visible to lookups, and
    /// the database error otherwise, leaving the table unchanged.
    ///
    /// The lock is held across the database write, so registrations are
    /// serialized.
    pub fn insert_if_absent(&self, name: &str, passwd: &str) -> Result<bool> {
        let mut users = self.users.lock();
        if users.contains_key(name) {
            return Ok(false);
        }
        self.db.insert_user(name, passwd)?;
        users.insert(name.to_string(), passwd.to_string());
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.users.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.lock().is_empty()
    }
}

impl fmt::Debug for UserStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserStore").field("users", &self.len()).finish()
    }
}

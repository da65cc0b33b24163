//! Persistence behind the credential store.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Backing storage for user accounts.
pub trait UserDatabase: Send + Sync {
    /// Every stored `(username, password)` pair.
    fn load_users(&self) -> Result<Vec<(String, String)>>;

    /// Persists one new account.
    fn insert_user(&self, name: &str, passwd: &str) -> Result<()>;
}

/// User table kept as a YAML mapping of username to password.
///
/// ```yaml
/// alice: secret
/// bob: hunter2
/// ```
#[derive(Debug, Clone)]
pub struct UserFile {
    path: PathBuf,
}

impl UserFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(&self) -> Result<BTreeMap<String, String>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", self.path.display()))
    }

    fn write_table(&self, table: &BTreeMap<String, String>) -> Result<()> {
        let text = serde_yaml::to_string(table)?;
        let tmp = self.path.with_extension("yaml.tmp");
        fs::write(&tmp, text).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

impl UserDatabase for UserFile {
    fn load_users(&self) -> Result<Vec<(String, String)>> {
        Ok(self.read_table()?.into_iter().collect())
    }

    fn insert_user(&self, name: &str, passwd: &str) -> Result<()> {
        let mut table = self.read_table()?;
        if table.contains_key(name) {
            anyhow::bail!("user {name:?} already stored");
        }
        table.insert(name.to_string(), passwd.to_string());
        self.write_table(&table)
    }
}

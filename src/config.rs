use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::http::buffer::{READ_BUFFER_SIZE, WRITE_BUFFER_SIZE};

/// Environment variable naming the YAML config file.
pub const CONFIG_ENV: &str = "TINYWEB_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "tinyweb.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub users: UsersConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub read_buffer_size: usize,
    pub write_buffer_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Directory the request URLs are resolved against
    pub doc_root: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UsersConfig {
    /// YAML user table
    pub path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            read_buffer_size: READ_BUFFER_SIZE,
            write_buffer_size: WRITE_BUFFER_SIZE,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            doc_root: PathBuf::from("./root"),
        }
    }
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./users.yaml"),
        }
    }
}

impl Config {
    /// Loads `$TINYWEB_CONFIG` (or `tinyweb.yaml`), then applies the `LISTEN`
    /// and `DOC_ROOT` environment overrides.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut cfg = Self::from_file(Path::new(&path))?;
        cfg.apply_overrides(std::env::var("LISTEN").ok(), std::env::var("DOC_ROOT").ok());
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads a YAML config file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn apply_overrides(&mut self, listen_addr: Option<String>, doc_root: Option<String>) {
        if let Some(addr) = listen_addr {
            self.server.listen_addr = addr;
        }
        if let Some(root) = doc_root {
            self.site.doc_root = PathBuf::from(root);
        }
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.server.read_buffer_size >= 64,
            "server.read_buffer_size must be at least 64 bytes"
        );
        anyhow::ensure!(
            self.server.write_buffer_size >= 256,
            "server.write_buffer_size must be at least 256 bytes"
        );
        Ok(())
    }
}

//! Maps a parsed request onto a file under the document root.
//!
//! # Routing
//!
//! The first byte after the last `/` of the URL selects a fixed page:
//!
//! | key | method | target                                    |
//! |-----|--------|-------------------------------------------|
//! | `0` | any    | `/register.html`                          |
//! | `1` | any    | `/log.html`                               |
//! | `2` | POST   | login: `/welcome.html` or `/logError.html` |
//! | `3` | POST   | register: `/log.html` or `/registerError.html` |
//! | `5` | any    | `/picture.html`                           |
//! | `6` | any    | `/video.html`                             |
//! | `7` | any    | `/fans.html`                              |
//!
//! Anything else is served from `doc_root + url`.

use std::fs::{self, File};
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::http::error::RequestError;
use crate::http::mapping::FileMapping;
use crate::http::request::{Method, Request};
use crate::users::UserStore;

pub const REGISTER_PAGE: &str = "/register.html";
pub const LOGIN_PAGE: &str = "/log.html";
pub const WELCOME_PAGE: &str = "/welcome.html";
pub const LOGIN_ERROR_PAGE: &str = "/logError.html";
pub const REGISTER_ERROR_PAGE: &str = "/registerError.html";
pub const PICTURE_PAGE: &str = "/picture.html";
pub const VIDEO_PAGE: &str = "/video.html";
pub const FANS_PAGE: &str = "/fans.html";

/// Longest accepted user name or password, in bytes.
pub const MAX_FIELD_LEN: usize = 100;

/// Fixed page for a routing key, if it names one.
pub fn static_page(key: u8) -> Option<&'static str> {
    match key {
        b'0' => Some(REGISTER_PAGE),
        b'1' => Some(LOGIN_PAGE),
        b'5' => Some(PICTURE_PAGE),
        b'6' => Some(VIDEO_PAGE),
        b'7' => Some(FANS_PAGE),
        _ => None,
    }
}

/// The byte following the last `/` of `url`.
pub fn route_key(url: &str) -> Option<u8> {
    let slash = url.rfind('/')?;
    url.as_bytes().get(slash + 1).copied()
}

/// Credentials posted by the login and registration pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub user: String,
    pub passwd: String,
}

impl LoginForm {
    /// Parses exactly `user=<name>&passwd=<password>`.
    ///
    /// Fields are taken verbatim (no percent-decoding). The name ends at the
    /// first `&`; the password runs to the end of the body.
    pub fn parse(body: &[u8]) -> Result<Self, RequestError> {
        let rest = body.strip_prefix(b"user=").ok_or(RequestError::BadRequest)?;
        let amp = rest
            .iter()
            .take(MAX_FIELD_LEN + 1)
            .position(|&b| b == b'&')
            .ok_or(RequestError::BadRequest)?;
        let (user, rest) = rest.split_at(amp);
        let passwd = rest
            .strip_prefix(b"&passwd=")
            .ok_or(RequestError::BadRequest)?;

        if user.is_empty() || user.len() > MAX_FIELD_LEN || passwd.len() > MAX_FIELD_LEN {
            return Err(RequestError::BadRequest);
        }

        Ok(Self {
            user: field(user)?,
            passwd: field(passwd)?,
        })
    }
}

fn field(bytes: &[u8]) -> Result<String, RequestError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| RequestError::BadRequest)
}

/// A file ready to be sent as a response body.
#[derive(Debug)]
pub struct StaticFile {
    pub path: PathBuf,
    pub len: usize,
    /// Absent for zero-length files, which cannot be mapped.
    pub mapping: Option<FileMapping>,
}

impl StaticFile {
    pub fn into_mapping(self) -> Option<FileMapping> {
        self.mapping
    }
}

/// Resource resolver shared by every connection.
#[derive(Debug, Clone)]
pub struct Resolver {
    doc_root: PathBuf,
    users: Arc<UserStore>,
}

impl Resolver {
    pub fn new(doc_root: impl Into<PathBuf>, users: Arc<UserStore>) -> Self {
        Self {
            doc_root: doc_root.into(),
            users,
        }
    }

    pub fn doc_root(&self) -> &Path {
        &self.doc_root
    }

    pub fn users(&self) -> &Arc<UserStore> {
        &self.users
    }

    /// Resolves `request`, rewriting its URL for the login and registration
    /// flows, and maps the target file.
    pub fn resolve(&self, request: &mut Request) -> Result<StaticFile, RequestError> {
        let key = route_key(&request.url);

        if request.method == Method::POST && matches!(key, Some(b'2' | b'3')) {
            let form = LoginForm::parse(&request.body)?;
            let page = if key == Some(b'3') {
                self.register(&form)
            } else {
                self.login(&form)
            };
            request.url = page.to_string();
        }

        let target = key
            .and_then(static_page)
            .unwrap_or(request.url.as_str());
        self.open(target)
    }

    /// Target page after a login attempt.
    pub fn login(&self, form: &LoginForm) -> &'static str {
        if self.users.verify(&form.user, &form.passwd) {
            tracing::info!(user = %form.user, "Login succeeded");
            WELCOME_PAGE
        } else {
            tracing::info!(user = %form.user, "Login rejected");
            LOGIN_ERROR_PAGE
        }
    }

    /// Target page after a registration attempt.
    pub fn register(&self, form: &LoginForm) -> &'static str {
        if self.users.lookup(&form.user).is_some() {
            return REGISTER_ERROR_PAGE;
        }
        match self.users.insert_if_absent(&form.user, &form.passwd) {
            Ok(true) => {
                tracing::info!(user = %form.user, "Registered user");
                LOGIN_PAGE
            }
            Ok(false) => REGISTER_ERROR_PAGE,
            Err(e) => {
                tracing::warn!(user = %form.user, error = %e, "Failed to persist user");
                REGISTER_ERROR_PAGE
            }
        }
    }

    /// Checks `url` under the document root and maps it.
    pub fn open(&self, url: &str) -> Result<StaticFile, RequestError> {
        let relative = Path::new(url.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(RequestError::BadRequest);
        }
        let path = self.doc_root.join(relative);

        let meta = fs::metadata(&path).map_err(|_| RequestError::NoResource)?;
        if meta.permissions().mode() & 0o004 == 0 {
            return Err(RequestError::Forbidden);
        }
        if meta.is_dir() {
            return Err(RequestError::BadRequest);
        }

        let len = usize::try_from(meta.len()).map_err(|_| RequestError::InternalError)?;
        let file = File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => RequestError::NoResource,
            io::ErrorKind::PermissionDenied => RequestError::Forbidden,
            _ => RequestError::InternalError,
        })?;

        let mapping = if len == 0 {
            None
        } else {
            let mapping = FileMapping::map(&file, len).map_err(|e| {
                tracing::error!(path = %path.display(), error = %e, "mmap failed");
                RequestError::InternalError
            })?;
            Some(mapping)
        };

        Ok(StaticFile { path, len, mapping })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_key_is_byte_after_last_slash() {
        assert_eq!(route_key("/2CGISQL.cgi"), Some(b'2'));
        assert_eq!(route_key("/img/5"), Some(b'5'));
        assert_eq!(route_key("/dir/"), None);
    }

    #[test]
    fn parses_login_form() {
        let form = LoginForm::parse(b"user=alice&passwd=se&cret").unwrap();
        assert_eq!(form.user, "alice");
        assert_eq!(form.passwd, "se&cret");
    }

    #[test]
    fn rejects_misshapen_forms() {
        for body in [
            &b"name=alice&passwd=x"[..],
            b"user=alice",
            b"user=alice&password=x",
            b"user=&passwd=x",
            b"passwd=x&user=alice",
        ] {
            assert_eq!(LoginForm::parse(body), Err(RequestError::BadRequest));
        }
    }

    #[test]
    fn bounds_field_length() {
        let long = "a".repeat(MAX_FIELD_LEN + 1);
        let body = format!("user={long}&passwd=x");
        assert_eq!(LoginForm::parse(body.as_bytes()), Err(RequestError::BadRequest));

        let body = format!("user=x&passwd={long}");
        assert_eq!(LoginForm::parse(body.as_bytes()), Err(RequestError::BadRequest));

        let max = "a".repeat(MAX_FIELD_LEN);
        let body = format!("user={max}&passwd={max}");
        assert!(LoginForm::parse(body.as_bytes()).is_ok());
    }
}

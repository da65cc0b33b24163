//! Shared fixtures: a scripted non-blocking socket, a recording user
//! database and a self-cleaning temp directory.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, IoSlice, Read, Write};
use std::net::SocketAddr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tinyweb::http::resolver::Resolver;
use tinyweb::users::{UserDatabase, UserStore};

/// One scripted response to a write call.
#[derive(Debug, Clone, Copy)]
pub enum WriteStep {
    /// Accept at most this many bytes.
    Accept(usize),
    WouldBlock,
    Fail,
}

/// In-memory non-blocking socket.
///
/// Reads hand out queued chunks, then `WouldBlock` (or end of stream once
/// `eof` is set). Writes follow `write_plan`, accepting everything once the
/// plan is exhausted.
#[derive(Debug, Default)]
pub struct MockSocket {
    pub incoming: VecDeque<Vec<u8>>,
    pub eof: bool,
    pub write_plan: VecDeque<WriteStep>,
    pub written: Vec<u8>,
    pub write_calls: usize,
}

impl MockSocket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(data: &[u8]) -> Self {
        let mut sock = Self::new();
        sock.push_input(data);
        sock
    }

    pub fn push_input(&mut self, data: &[u8]) {
        self.incoming.push_back(data.to_vec());
    }

    pub fn written_str(&self) -> String {
        String::from_utf8_lossy(&self.written).into_owned()
    }
}

impl Read for MockSocket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(mut chunk) = self.incoming.pop_front() else {
            if self.eof {
                return Ok(0);
            }
            return Err(io::ErrorKind::WouldBlock.into());
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            self.incoming.push_front(chunk.split_off(n));
        }
        Ok(n)
    }
}

impl Write for MockSocket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_vectored(&[IoSlice::new(buf)])
    }

    fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
        self.write_calls += 1;
        let limit = match self.write_plan.pop_front() {
            Some(WriteStep::Accept(n)) => n,
            Some(WriteStep::WouldBlock) => return Err(io::ErrorKind::WouldBlock.into()),
            Some(WriteStep::Fail) => return Err(io::ErrorKind::ConnectionReset.into()),
            None => usize::MAX,
        };
        let mut taken = 0;
        for buf in bufs {
            let n = buf.len().min(limit - taken);
            self.written.extend_from_slice(&buf[..n]);
            taken += n;
            if taken == limit {
                break;
            }
        }
        Ok(taken)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// User database that counts calls and can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingDatabase {
    pub inserts: Arc<AtomicUsize>,
    pub rows: Arc<Mutex<Vec<(String, String)>>>,
    pub fail: bool,
}

impl RecordingDatabase {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

impl UserDatabase for RecordingDatabase {
    fn load_users(&self) -> anyhow::Result<Vec<(String, String)>> {
        Ok(self.rows.lock().unwrap().clone())
    }

    fn insert_user(&self, name: &str, passwd: &str) -> anyhow::Result<()> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("database unavailable");
        }
        self.rows
            .lock()
            .unwrap()
            .push((name.to_string(), passwd.to_string()));
        Ok(())
    }
}

/// Directory under the system temp dir, removed on drop.
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub fn new(tag: &str) -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        let path = std::env::temp_dir().join(format!(
            "tinyweb-{}-{}-{}",
            tag,
            std::process::id(),
            NEXT.fetch_add(1, Ordering::SeqCst)
        ));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes a world-readable file relative to the directory.
    pub fn file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.path.join(name.trim_start_matches('/'));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// Document root holding the pages the routing table points at.
pub fn site() -> TempDir {
    let dir = TempDir::new("site");
    for page in [
        "judge.html",
        "register.html",
        "log.html",
        "welcome.html",
        "logError.html",
        "registerError.html",
        "picture.html",
        "video.html",
        "fans.html",
    ] {
        dir.file(page, format!("<html>{page}</html>").as_bytes());
    }
    dir
}

pub fn resolver_with(dir: &TempDir, db: RecordingDatabase) -> Arc<Resolver> {
    let users = UserStore::load(Box::new(db)).unwrap();
    Arc::new(Resolver::new(dir.path(), Arc::new(users)))
}

pub fn peer() -> SocketAddr {
    "127.0.0.1:50000".parse().unwrap()
}

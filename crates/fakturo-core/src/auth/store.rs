//! Durable session persistence.
//!
//! Sessions survive application restarts through three keys written to the
//! data directory: the user record, the access token, and the refresh token.
//! They are set and cleared together as a logical unit on every session
//! transition, even though the underlying writes are separate.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Keys the session lifecycle persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKey {
    /// JSON-serialized `User` record.
    User,
    /// Short-lived bearer credential.
    AccessToken,
    /// Longer-lived credential exchanged for fresh token pairs.
    RefreshToken,
}

impl StoreKey {
    fn file_name(self) -> &'static str {
        match self {
            StoreKey::User => "user",
            StoreKey::AccessToken => "access-token",
            StoreKey::RefreshToken => "refresh-token",
        }
    }
}

/// Durable backing storage for session state.
///
/// Storage is a side-effect target: once the in-memory session is hydrated
/// it is the source of truth, and callers log store failures rather than
/// propagating them into the session lifecycle.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: StoreKey) -> Result<Option<String>>;
    fn put(&self, key: StoreKey, value: &str) -> Result<()>;
    fn remove(&self, key: StoreKey) -> Result<()>;
}

/// File-backed store keeping one small file per key.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create session store directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path(&self, key: StoreKey) -> PathBuf {
        self.dir.join(key.file_name())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: StoreKey) -> Result<Option<String>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents =
            fs::read_to_string(&path).with_context(|| format!("Failed to read session key {:?}", key))?;
        Ok(Some(contents))
    }

    fn put(&self, key: StoreKey, value: &str) -> Result<()> {
        fs::write(self.path(key), value)
            .with_context(|| format!("Failed to write session key {:?}", key))
    }

    fn remove(&self, key: StoreKey) -> Result<()> {
        let path = self.path(key);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove session key {:?}", key))?;
        }
        Ok(())
    }
}

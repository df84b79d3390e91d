//! Cache storage backends.
//!
//! A backend is a byte-oriented key-value store with per-entry expiry.
//! Expired entries read as misses; they are overwritten wholesale on the
//! next `set`.

use crate::cache::error::CacheError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// A key-value store with time-to-live.
#[async_trait]
pub trait CacheBackend: Send + Sync + std::fmt::Debug {
    /// Returns the value stored under `key`, unless absent or expired.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the store cannot be read.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the store cannot be written.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;
}

/// One stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The key the value is stored under
    pub key: String,
    /// The stored bytes
    pub value: Vec<u8>,
    /// When the entry stops being served
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry that expires `ttl` from now.
    ///
    /// # Errors
    ///
    /// Returns a backend error if `ttl` is too large to represent.
    pub fn new(key: impl Into<String>, value: Vec<u8>, ttl: Duration) -> Result<Self, CacheError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| CacheError::backend(format!("invalid ttl: {}", e)))?;
        Ok(Self {
            key: key.into(),
            value,
            expires_at: Utc::now() + ttl,
        })
    }

    /// Returns true if the entry has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// In-process cache guarded by a single mutex.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries. Expired entries count until the next
    /// `set`, or a `get` of their key, drops them.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or_default()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> CacheError {
    CacheError::backend("memory cache lock poisoned")
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        match entries.get(key) {
            None => return Ok(None),
            Some(entry) if !entry.is_expired_at(Utc::now()) => {
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => {}
        }
        entries.remove(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let entry = CacheEntry::new(key, value, ttl)?;
        let mut entries = self.entries.lock().map_err(poisoned)?;
        let now = Utc::now();
        entries.retain(|_, existing| !existing.is_expired_at(now));
        entries.insert(key.to_string(), entry);
        Ok(())
    }
}

/// Cache storing one JSON file per key.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Creates a cache rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The default cache directory, e.g. `~/.cache/tool-relay`.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::cache_dir().map(|d| d.join("tool-relay"))
    }

    /// The directory entries are stored in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

#[async_trait]
impl CacheBackend for FileCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.path_for(key);
        let contents = match tokio::fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CacheError::backend(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let entry: CacheEntry = match serde_json::from_slice(&contents) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring corrupt cache file");
                return Ok(None);
            }
        };

        // Sanitized file names can collide; only serve the exact key.
        if entry.key != key || entry.is_expired_at(Utc::now()) {
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let entry = CacheEntry::new(key, value, ttl)?;
        let bytes = serde_json::to_vec(&entry)
            .map_err(|e| CacheError::serialization(e.to_string()))?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            CacheError::backend(format!("failed to create {}: {}", self.dir.display(), e))
        })?;

        let path = self.path_for(key);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| CacheError::backend(format!("failed to write {}: {}", path.display(), e)))
    }
}

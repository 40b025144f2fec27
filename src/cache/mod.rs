//! Content-addressable storage for rendered pages.
//!
//! # Architecture Overview
//!
//! - [`key`]: canonical parameter strings and SHA-256 key derivation
//! - [`CacheStore`]: the storage contract (get / set / invalidate / clear)
//! - [`FilesystemCacheStore`]: one directory per key under a root directory
//! - [`CacheRegistry`]: backend name -> factory, so stores can be created from
//!   configuration without touching call sites
//!
//! # Cache Directory Structure
//!
//! ```text
//! <cache_root>/
//! ├── 3f1a…9c/                 # 64 hex characters, one directory per key
//! │   └── report-1.png         # exactly one payload file
//! ├── 8b02…e1/
//! │   └── report-2.png
//! └── .staging-XXXXXX/         # transient, in-flight writes only
//! ```
//!
//! # Lookups
//!
//! [`CacheStore::get`] reports a missing entry as
//! [`PageCacheError::CacheMiss`], distinct from every real failure, so callers
//! can branch on it with [`PageCacheError::is_not_found`]. Corrupted entries
//! are reported, never repaired or silently skipped.
//!
//! # Examples
//!
//! ```rust,no_run
//! use pagecache::cache::{CacheConfig, CacheEntry, CacheRegistry};
//!
//! # fn example() -> anyhow::Result<()> {
//! let registry = CacheRegistry::with_builtin_backends();
//! let store = registry.create(&CacheConfig::filesystem("/var/cache/pagecache"))?;
//!
//! store.set(&CacheEntry::new("ab".repeat(32), b"png bytes".to_vec(), "report-1.png"))?;
//! match store.get(&"ab".repeat(32)) {
//!     Ok(entry) => println!("{} bytes", entry.data.len()),
//!     Err(e) if e.is_not_found() => println!("miss"),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod filesystem;
pub mod key;
pub mod registry;

pub use filesystem::FilesystemCacheStore;
pub use key::{RenderParameters, derive_key};
pub use registry::{CacheFactory, CacheRegistry};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::{DIRECTORY_OPTION, FILESYSTEM_BACKEND};
use crate::core::{PageCacheError, Result};

/// Backend-specific string options, e.g. `{"directory": "/var/cache/pages"}`.
pub type CacheOptions = BTreeMap<String, String>;

/// One stored rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Hex digest identifying the entry
    pub key: String,
    /// Payload bytes (the rendered image)
    pub data: Vec<u8>,
    /// Suggested file name, for display only; never used for lookup
    pub filename: String,
}

impl CacheEntry {
    /// Creates an entry.
    pub fn new(key: impl Into<String>, data: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            data,
            filename: filename.into(),
        }
    }
}

/// Summary of a stored entry, without its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntryInfo {
    pub key: String,
    pub filename: String,
    /// Payload size in bytes
    pub size: u64,
}

/// Which backend to create and how to configure it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Registered backend name
    #[serde(rename = "type")]
    pub backend: String,
    /// Backend-specific options
    #[serde(default)]
    pub options: CacheOptions,
}

impl CacheConfig {
    /// Configuration for the filesystem backend rooted at `directory`.
    pub fn filesystem(directory: impl Into<String>) -> Self {
        Self {
            backend: FILESYSTEM_BACKEND.to_string(),
            options: CacheOptions::from([(DIRECTORY_OPTION.to_string(), directory.into())]),
        }
    }
}

/// Persistent storage for rendered pages, addressed by derived key.
///
/// Implementations must be safe to share between threads. Operations on
/// different keys must not interfere; concurrent [`set`](CacheStore::set)
/// calls on one key resolve as last-write-wins and readers never observe a
/// partially written payload.
pub trait CacheStore: Send + Sync {
    /// Fetches the entry stored under `key`.
    ///
    /// # Errors
    ///
    /// [`PageCacheError::CacheMiss`] when nothing is stored (a normal
    /// outcome); [`PageCacheError::CacheCorrupted`] when the stored state is
    /// invalid; other variants for real failures.
    fn get(&self, key: &str) -> Result<CacheEntry>;

    /// Stores `entry`, replacing any previous entry under the same key.
    fn set(&self, entry: &CacheEntry) -> Result<()>;

    /// Removes the entry under `key`. Removing a missing entry succeeds.
    fn invalidate(&self, key: &str) -> Result<()>;

    /// Removes all entries, attempting every one before reporting failures.
    fn clear(&self) -> Result<()>;

    /// Lists stored entries, sorted by key.
    fn entries(&self) -> Result<Vec<CacheEntryInfo>>;

    /// Human-readable location of the store, for diagnostics.
    fn location(&self) -> String;
}

/// Rejects keys that are unusable as a single path component.
///
/// Keys starting with `.` are reserved for staging directories.
pub fn validate_key(key: &str) -> Result<()> {
    let reason = if key.is_empty() {
        Some("key is empty")
    } else if key.starts_with('.') {
        Some("key must not start with '.'")
    } else if key.contains(['/', '\\', '\0']) {
        Some("key must not contain path separators")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(PageCacheError::InvalidCacheKey {
            key: key.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

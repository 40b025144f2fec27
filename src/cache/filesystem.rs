//! Filesystem-backed [`CacheStore`].
//!
//! Every key gets its own directory under the cache root holding exactly one
//! file, the payload, named after the entry's suggested file name:
//!
//! ```text
//! <root>/<key>/<filename>
//! ```
//!
//! # Atomic Writes
//!
//! [`set`](FilesystemCacheStore::set) never writes into a key directory in
//! place. The payload is written and synced inside a hidden staging directory
//! under the root, then moved into position with a rename:
//!
//! - key directory absent: the whole staging directory is renamed to
//!   `<root>/<key>`, so the entry appears complete in one step
//! - key directory present: the staged file is renamed over
//!   `<root>/<key>/<filename>`, then any other leftover files in the key
//!   directory are pruned
//!
//! Readers therefore never see a truncated payload, and concurrent writers of
//! the same key resolve as last-rename-wins.
//!
//! # Corruption
//!
//! A key directory with zero entries, more than one entry, or a directory
//! where the payload should be is reported as
//! [`PageCacheError::CacheCorrupted`]. So is a plain file in place of the key
//! directory. Nothing is repaired automatically; use
//! [`invalidate`](FilesystemCacheStore::invalidate) to drop the entry.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::cache::{CacheEntry, CacheEntryInfo, CacheOptions, CacheStore, validate_key};
use crate::constants::{DIRECTORY_OPTION, STAGING_PREFIX};
use crate::core::{PageCacheError, Result};
use crate::utils::platform::{absolute_path, resolve_path};

/// [`CacheStore`] keeping one directory per key under a root directory.
///
/// Holds no in-process state besides the root path, so it is freely shared
/// between threads; coordination is left to the filesystem.
#[derive(Debug, Clone)]
pub struct FilesystemCacheStore {
    root: PathBuf,
}

impl FilesystemCacheStore {
    /// Creates a store from backend options.
    ///
    /// Requires a non-empty `directory` option. The directory is expanded
    /// (`~`, environment variables), made absolute, created with its parents
    /// when missing and checked for writability.
    ///
    /// # Errors
    ///
    /// [`PageCacheError::InvalidConfig`] for a missing or empty option, and
    /// for a directory that cannot be created or written.
    pub fn from_options(options: &CacheOptions) -> Result<Self> {
        let directory = options
            .get(DIRECTORY_OPTION)
            .map(|d| d.trim())
            .filter(|d| !d.is_empty())
            .ok_or_else(|| {
                PageCacheError::config(format!(
                    "filesystem cache requires a non-empty '{DIRECTORY_OPTION}' option"
                ))
            })?;

        Self::new(resolve_path(directory)?)
    }

    /// Creates a store rooted at `root`, creating it when missing.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = absolute_path(root.as_ref())?;

        if root.exists() && !root.is_dir() {
            return Err(PageCacheError::config(format!(
                "cache directory {} exists but is not a directory",
                root.display()
            )));
        }

        fs::create_dir_all(&root).map_err(|e| {
            PageCacheError::config(format!(
                "cannot create cache directory {}: {e}",
                root.display()
            ))
        })?;

        Self::check_writable(&root)?;

        tracing::debug!("Filesystem cache ready at {}", root.display());
        Ok(Self { root })
    }

    fn check_writable(root: &Path) -> Result<()> {
        let mut probe = tempfile::Builder::new()
            .prefix(".probe-")
            .tempfile_in(root)
            .map_err(|e| {
                PageCacheError::config(format!(
                    "cache directory {} is not writable: {e}",
                    root.display()
                ))
            })?;
        probe.write_all(b"probe").map_err(|e| {
            PageCacheError::config(format!(
                "cache directory {} is not writable: {e}",
                root.display()
            ))
        })?;
        Ok(())
    }

    /// The absolute cache root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the entry for `key`.
    #[must_use]
    pub fn key_dir(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Resolves the single payload file of a key directory.
    fn payload_path(&self, key: &str) -> Result<PathBuf> {
        let dir = self.key_dir(key);

        let meta = match fs::symlink_metadata(&dir) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PageCacheError::CacheMiss {
                    key: key.to_string(),
                });
            }
            Err(e) => return Err(PageCacheError::io("stat", key, &dir, e)),
        };

        if !meta.is_dir() {
            return Err(corrupted(key, &dir, "expected a directory, found a file"));
        }

        let mut entries = Vec::new();
        let listing = fs::read_dir(&dir).map_err(|e| match e.kind() {
            ErrorKind::NotFound => PageCacheError::CacheMiss {
                key: key.to_string(),
            },
            _ => PageCacheError::io("list", key, &dir, e),
        })?;
        for entry in listing {
            entries.push(entry.map_err(|e| PageCacheError::io("list", key, &dir, e))?);
        }

        match entries.as_slice() {
            [] => Err(corrupted(key, &dir, "directory is empty")),
            [single] => {
                let file_type = single
                    .file_type()
                    .map_err(|e| PageCacheError::io("stat", key, single.path(), e))?;
                if file_type.is_file() {
                    Ok(single.path())
                } else {
                    Err(corrupted(
                        key,
                        &dir,
                        format!(
                            "expected a payload file, found directory '{}'",
                            single.file_name().to_string_lossy()
                        ),
                    ))
                }
            }
            many => Err(corrupted(
                key,
                &dir,
                format!("expected exactly one file, found {} entries", many.len()),
            )),
        }
    }

    /// Writes `data` into a fresh staging directory under the root.
    fn stage(&self, key: &str, filename: &str, data: &[u8]) -> Result<tempfile::TempDir> {
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&self.root)
            .map_err(|e| PageCacheError::io("stage", key, &self.root, e))?;

        let staged_file = staging.path().join(filename);
        let mut file = fs::File::create(&staged_file)
            .map_err(|e| PageCacheError::io("write", key, &staged_file, e))?;
        file.write_all(data)
            .map_err(|e| PageCacheError::io("write", key, &staged_file, e))?;
        file.sync_all()
            .map_err(|e| PageCacheError::io("sync", key, &staged_file, e))?;

        Ok(staging)
    }

    /// Removes everything in `dir` except `keep`.
    fn prune_except(&self, key: &str, dir: &Path, keep: &str) -> Result<()> {
        let listing = fs::read_dir(dir).map_err(|e| PageCacheError::io("list", key, dir, e))?;
        for entry in listing {
            let entry = entry.map_err(|e| PageCacheError::io("list", key, dir, e))?;
            if entry.file_name() == keep {
                continue;
            }
            let path = entry.path();
            let removed = match entry.file_type() {
                Ok(t) if t.is_dir() => fs::remove_dir_all(&path),
                _ => fs::remove_file(&path),
            };
            match removed {
                Ok(()) => tracing::debug!("Pruned stale cache file {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(PageCacheError::io("prune", key, path, e)),
            }
        }
        Ok(())
    }
}

impl CacheStore for FilesystemCacheStore {
    fn get(&self, key: &str) -> Result<CacheEntry> {
        validate_key(key)?;
        let path = self.payload_path(key)?;

        let data = fs::read(&path).map_err(|e| match e.kind() {
            // Invalidated between listing and reading
            ErrorKind::NotFound => PageCacheError::CacheMiss {
                key: key.to_string(),
            },
            _ => PageCacheError::io("read", key, &path, e),
        })?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        tracing::trace!("Read {} bytes for {key}", data.len());
        Ok(CacheEntry {
            key: key.to_string(),
            data,
            filename,
        })
    }

    fn set(&self, entry: &CacheEntry) -> Result<()> {
        validate_key(&entry.key)?;
        let key = entry.key.as_str();
        let filename = sanitize_filename(&entry.filename);
        let dir = self.key_dir(key);

        let staging = self.stage(key, &filename, &entry.data)?;

        match fs::rename(staging.path(), &dir) {
            Ok(()) => {
                // The staging directory now lives at `dir`; don't let the guard delete it.
                let _ = staging.keep();
            }
            Err(_) if dir.is_dir() => {
                let target = dir.join(&filename);
                fs::rename(staging.path().join(&filename), &target)
                    .map_err(|e| PageCacheError::io("write", key, &target, e))?;
                self.prune_except(key, &dir, &filename)?;
            }
            Err(e) => return Err(PageCacheError::io("write", key, &dir, e)),
        }

        tracing::trace!("Stored {} bytes for {key} as {filename}", entry.data.len());
        Ok(())
    }

    fn invalidate(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let dir = self.key_dir(key);

        let removed = match fs::symlink_metadata(&dir) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(&dir),
            Ok(_) => fs::remove_file(&dir),
            Err(e) => Err(e),
        };

        match removed {
            Ok(()) => {
                tracing::debug!("Invalidated cache entry {key}");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PageCacheError::io("remove", key, dir, e)),
        }
    }

    fn clear(&self) -> Result<()> {
        let listing = match fs::read_dir(&self.root) {
            Ok(listing) => listing,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(PageCacheError::io("list", "*", &self.root, e)),
        };

        let mut failures = Vec::new();
        let mut removed = 0usize;

        for entry in listing {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    failures.push(format!("{}: {e}", self.root.display()));
                    continue;
                }
            };

            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                tracing::debug!("Skipping non-directory {} during clear", entry.path().display());
                continue;
            }

            // Staging directories belong to in-flight sets
            if validate_key(&entry.file_name().to_string_lossy()).is_err() {
                tracing::debug!("Skipping {} during clear", entry.path().display());
                continue;
            }

            match fs::remove_dir_all(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!("Failed to remove {}: {e}", entry.path().display());
                    failures.push(format!("{}: {e}", entry.file_name().to_string_lossy()));
                }
            }
        }

        tracing::debug!("Cleared {removed} cache entries from {}", self.root.display());

        if failures.is_empty() {
            Ok(())
        } else {
            Err(PageCacheError::ClearFailed { failures })
        }
    }

    fn entries(&self) -> Result<Vec<CacheEntryInfo>> {
        let listing =
            fs::read_dir(&self.root).map_err(|e| PageCacheError::io("list", "*", &self.root, e))?;

        let mut infos = Vec::new();
        for entry in listing {
            let entry = entry.map_err(|e| PageCacheError::io("list", "*", &self.root, e))?;
            let key = entry.file_name().to_string_lossy().into_owned();
            if validate_key(&key).is_err() || !entry.path().is_dir() {
                continue;
            }

            match self.payload_path(&key) {
                Ok(path) => {
                    let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                    let filename = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    infos.push(CacheEntryInfo {
                        key,
                        filename,
                        size,
                    });
                }
                Err(e) if e.is_not_found() => {}
                Err(e) => tracing::warn!("{e}"),
            }
        }

        infos.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(infos)
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}

fn corrupted(key: &str, path: &Path, reason: impl Into<String>) -> PageCacheError {
    PageCacheError::CacheCorrupted {
        key: key.to_string(),
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Makes a suggested file name safe to use as a single path component.
fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "payload".to_string()
    } else {
        cleaned.to_string()
    }
}

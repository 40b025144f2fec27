//! Temporary workspace for cache and CLI tests.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use crate::cache::{CacheStore, FilesystemCacheStore};

/// A temp directory holding a cache root, a sample document and room for
/// config and output files. Everything is removed on drop.
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub cache_dir: PathBuf,
    pub output_dir: PathBuf,
    document: PathBuf,
}

impl TestEnvironment {
    /// Create a new test environment
    pub fn new() -> Result<Self> {
        super::init_test_logging(None);

        let temp_dir = TempDir::new()?;
        let cache_dir = temp_dir.path().join("cache");
        let output_dir = temp_dir.path().join("out");
        fs::create_dir_all(&cache_dir)?;

        let document = temp_dir.path().join("report.pdf");
        fs::write(&document, b"%PDF-1.4\n%%EOF\n")?;
        // Keys are derived from the canonical path
        let document = document.canonicalize()?;

        Ok(Self {
            temp_dir,
            cache_dir,
            output_dir,
            document,
        })
    }

    /// Canonical path of the sample document.
    pub fn document(&self) -> &Path {
        &self.document
    }

    /// A filesystem store over [`cache_dir`](Self::cache_dir).
    pub fn store(&self) -> Arc<dyn CacheStore> {
        Arc::new(self.filesystem_store())
    }

    /// The concrete store, for tests poking at the on-disk layout.
    pub fn filesystem_store(&self) -> FilesystemCacheStore {
        FilesystemCacheStore::new(&self.cache_dir)
            .unwrap_or_else(|e| panic!("failed to open test cache: {e}"))
    }

    /// Writes a config file pointing the cache at [`cache_dir`](Self::cache_dir),
    /// with `renderer` as the renderer section.
    pub fn write_config(&self, renderer: serde_json::Value) -> Result<PathBuf> {
        let config = serde_json::json!({
            "cache": {
                "type": "filesystem",
                "options": { "directory": self.cache_dir.display().to_string() }
            },
            "renderer": renderer,
        });
        let path = self.temp_dir.path().join("config.json");
        fs::write(&path, serde_json::to_vec_pretty(&config)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Immediate children of the cache root, sorted.
    pub fn cache_children(&self) -> Result<Vec<String>> {
        let mut names = fs::read_dir(&self.cache_dir)?
            .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<std::io::Result<Vec<_>>>()?;
        names.sort();
        Ok(names)
    }
}

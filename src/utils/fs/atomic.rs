//! Atomic file write operations using temp-and-rename strategy.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::utils::fs::dirs::ensure_dir;

/// Atomically writes bytes to a file using a write-then-rename strategy.
///
/// The content goes to a uniquely named temporary file in the target's
/// directory, is synced, then renamed over `path`. Readers see either the
/// old file or the complete new one, and concurrent writers to the same path
/// never share a temporary file.
///
/// Parent directories are created when missing.
///
/// # Examples
///
/// ```rust,no_run
/// use pagecache::utils::fs::atomic_write;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// atomic_write(Path::new("out/report-1.png"), b"\x89PNG...")?;
/// # Ok(())
/// # }
/// ```
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;

    let mut temp = tempfile::Builder::new()
        .prefix(".pagecache-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;

    temp.write_all(content)
        .with_context(|| format!("Failed to write temp file {}", temp.path().display()))?;
    temp.as_file().sync_all().with_context(|| "Failed to sync file to disk")?;

    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to rename temp file to {}", path.display()))?;

    Ok(())
}

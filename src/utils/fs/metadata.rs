//! Directory sizes.

use anyhow::{Context, Result};
use std::path::Path;

/// Total size in bytes of all regular files below `path`.
///
/// Symbolic links are not followed. A missing directory has size 0.
pub fn dir_size(path: &Path) -> Result<u64> {
    if !path.exists() {
        return Ok(0);
    }

    let mut size = 0;
    for entry in walkdir::WalkDir::new(path).follow_links(false) {
        let entry =
            entry.with_context(|| format!("Failed to walk directory: {}", path.display()))?;
        if entry.file_type().is_file() {
            size += entry
                .metadata()
                .with_context(|| format!("Failed to stat {}", entry.path().display()))?
                .len();
        }
    }
    Ok(size)
}

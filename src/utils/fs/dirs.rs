//! Directory helpers.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Creates `path` and its parents if needed.
///
/// # Errors
///
/// Fails when the directory cannot be created or `path` exists but is not a
/// directory.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).with_context(|| {
            format!(
                "Failed to create directory: {}\n\nCheck directory permissions and path validity",
                path.display()
            )
        })?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

//! Platform-specific helpers: executable lookup, path expansion and the
//! standard per-user directories.

use std::path::{Path, PathBuf};

use crate::constants::APP_DIR_NAME;
use crate::core::{PageCacheError, Result};

/// Checks if we're running on Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Checks whether `cmd` resolves to an executable in `PATH`.
#[must_use]
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Returns the first of `candidates` found in `PATH`.
///
/// Used to prefer ImageMagick 7's `magick` and fall back to the legacy
/// `convert` entry point.
#[must_use]
pub fn find_program(candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find(|candidate| command_exists(candidate))
        .map(|candidate| (*candidate).to_string())
}

/// Expands `~` and environment variables in a user-supplied path.
///
/// # Errors
///
/// Returns [`PageCacheError::InvalidConfig`] when a referenced environment
/// variable is not set or the home directory cannot be determined.
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path)
        .map_err(|e| PageCacheError::config(format!("cannot expand path '{path}': {e}")))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Turns `path` into an absolute path without requiring it to exist.
///
/// Relative paths are resolved against the current directory, then `.` and
/// `..` components are removed lexically.
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).map_err(|e| {
        PageCacheError::config(format!("cannot make '{}' absolute: {e}", path.display()))
    })?;
    Ok(normalize_path(&absolute))
}

/// Normalizes a path by resolving `.` and `..` components lexically.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                if matches!(components.last(), Some(std::path::Component::Normal(_))) {
                    components.pop();
                }
            }
            c => components.push(c),
        }
    }

    components.iter().collect()
}

/// Returns the platform cache directory for pagecache.
///
/// - **Linux**: `$XDG_CACHE_HOME/pagecache` or `$HOME/.cache/pagecache`
/// - **macOS**: `$HOME/Library/Caches/pagecache`
/// - **Windows**: `%LOCALAPPDATA%\pagecache`
pub fn get_cache_dir() -> anyhow::Result<PathBuf> {
    dirs::cache_dir().map(|p| p.join(APP_DIR_NAME)).ok_or_else(|| {
        let platform_help = if is_windows() {
            "On Windows: Check that the LOCALAPPDATA environment variable is set"
        } else if cfg!(target_os = "macos") {
            "On macOS: Check that the HOME environment variable is set"
        } else {
            "On Linux: Check that the XDG_CACHE_HOME or HOME environment variable is set"
        };
        anyhow::anyhow!("Could not determine cache directory.\n\n{platform_help}")
    })
}

/// Returns the platform config directory for pagecache.
///
/// - **Linux**: `$XDG_CONFIG_HOME/pagecache` or `$HOME/.config/pagecache`
/// - **macOS**: `$HOME/Library/Application Support/pagecache`
/// - **Windows**: `%APPDATA%\pagecache`
pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    dirs::config_dir()
        .map(|p| p.join(APP_DIR_NAME))
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

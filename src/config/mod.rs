//! Configuration file for pagecache.
//!
//! # Location
//!
//! The first of these wins:
//!
//! 1. `--config <path>` on the command line
//! 2. the `PAGECACHE_CONFIG` environment variable
//! 3. `<config_dir>/pagecache/config.json` (e.g. `~/.config/pagecache/config.json`)
//!
//! A missing file at the default location means "use defaults". A missing file
//! that was asked for explicitly is an error.
//!
//! # Format
//!
//! ```json
//! {
//!   "cache": { "type": "filesystem", "options": { "directory": "~/.cache/pagecache" } },
//!   "renderer": { "format": "jpeg", "resolution": 200, "quality": 85, "brightness": 110 },
//!   "max_parallel": 4
//! }
//! ```
//!
//! Every section is optional. Leaving out `cache` selects the filesystem
//! backend under the platform cache directory; `"cache": null` disables
//! caching entirely.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

use crate::cache::CacheConfig;
use crate::constants::{CONFIG_ENV_VAR, CONFIG_FILE_NAME};
use crate::renderer::RendererSettingsBuilder;
use crate::utils::platform::{get_cache_dir, get_config_dir};

/// The parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// `None`: not mentioned, `Some(None)`: explicitly disabled.
    #[serde(default, deserialize_with = "present")]
    cache: Option<Option<CacheConfig>>,

    /// Renderer settings layered under command-line flags.
    #[serde(default)]
    pub renderer: RendererSettingsBuilder,

    /// Upper bound on concurrent page renders.
    #[serde(default)]
    pub max_parallel: Option<usize>,
}

/// Distinguishes `"cache": null` from a missing `cache` key.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Option<CacheConfig>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<CacheConfig>::deserialize(deserializer).map(Some)
}

impl Config {
    /// Loads the configuration following the lookup order in the module docs.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
            return Self::load_from(Path::new(&path))
                .with_context(|| format!("Failed to load config named by {CONFIG_ENV_VAR}"));
        }

        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Loads a specific configuration file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// `<config_dir>/pagecache/config.json`.
    pub fn default_path() -> Result<PathBuf> {
        Ok(get_config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// The cache to use, or `None` when caching is disabled.
    ///
    /// Defaults to the filesystem backend under the platform cache directory.
    pub fn cache_config(&self) -> Result<Option<CacheConfig>> {
        match &self.cache {
            Some(explicit) => Ok(explicit.clone()),
            None => Ok(Some(Self::default_cache()?)),
        }
    }

    /// Replaces the cache section; `None` disables caching.
    pub fn set_cache(&mut self, cache: Option<CacheConfig>) {
        self.cache = Some(cache);
    }

    fn default_cache() -> Result<CacheConfig> {
        Ok(CacheConfig::filesystem(get_cache_dir()?.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FILESYSTEM_BACKEND;
    use serial_test::serial;
    use tempfile::TempDir;

    fn write(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_full_config() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            r#"{
                "cache": {"type": "filesystem", "options": {"directory": "/srv/pages"}},
                "renderer": {"format": "jpeg", "resolution": 200, "brightness": 110},
                "max_parallel": 3
            }"#,
        );

        let config = Config::load_from(&path).unwrap();
        assert_eq!(
            config.cache_config().unwrap(),
            Some(CacheConfig::filesystem("/srv/pages"))
        );
        assert_eq!(config.renderer.format.as_deref(), Some("jpeg"));
        assert_eq!(config.renderer.brightness, Some(110));
        assert_eq!(config.max_parallel, Some(3));
    }

    #[test]
    fn test_null_cache_disables_caching() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&write(&dir, r#"{"cache": null}"#)).unwrap();
        assert_eq!(config.cache_config().unwrap(), None);
    }

    #[test]
    fn test_missing_cache_uses_filesystem_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&write(&dir, "{}")).unwrap();
        let cache = config.cache_config().unwrap().unwrap();
        assert_eq!(cache.backend, FILESYSTEM_BACKEND);
        assert!(cache.options["directory"].ends_with("pagecache"));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let dir = TempDir::new().unwrap();
        let err = Config::load_from(&write(&dir, r#"{"renderer": {"dpi": 300}}"#)).unwrap_err();
        assert!(format!("{err:#}").contains("dpi"));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.json"))).is_err());
    }

    #[test]
    #[serial]
    fn test_env_var_selects_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, r#"{"max_parallel": 7}"#);

        unsafe {
            std::env::set_var(CONFIG_ENV_VAR, &path);
        }
        let loaded = Config::load(None);
        unsafe {
            std::env::remove_var(CONFIG_ENV_VAR);
        }

        assert_eq!(loaded.unwrap().max_parallel, Some(7));
    }

    #[test]
    #[serial]
    fn test_flag_overrides_env_var() {
        let dir = TempDir::new().unwrap();
        let from_env = write(&dir, r#"{"max_parallel": 7}"#);
        let from_flag = dir.path().join("flag.json");
        std::fs::write(&from_flag, r#"{"max_parallel": 2}"#).unwrap();

        unsafe {
            std::env::set_var(CONFIG_ENV_VAR, &from_env);
        }
        let loaded = Config::load(Some(&from_flag));
        unsafe {
            std::env::remove_var(CONFIG_ENV_VAR);
        }

        assert_eq!(loaded.unwrap().max_parallel, Some(2));
    }
}

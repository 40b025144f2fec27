//! Global constants used throughout the pagecache codebase.
//!
//! Defaults for renderer settings, validation bounds, parallelism parameters
//! and well-known names. Defining them centrally keeps magic numbers
//! discoverable.

/// Name of the built-in filesystem cache backend.
pub const FILESYSTEM_BACKEND: &str = "filesystem";

/// Option key holding the cache root for the filesystem backend.
pub const DIRECTORY_OPTION: &str = "directory";

/// Environment variable overriding the config file location.
pub const CONFIG_ENV_VAR: &str = "PAGECACHE_CONFIG";

/// Directory name used under the platform config and cache directories.
pub const APP_DIR_NAME: &str = "pagecache";

/// Config file name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Prefix of hidden staging directories inside a cache root.
///
/// Keys may never start with a dot, so staging directories cannot collide
/// with entries.
pub const STAGING_PREFIX: &str = ".staging-";

/// Default output resolution in dots per inch.
pub const DEFAULT_RESOLUTION: u32 = 150;

/// Default encoder quality (1-100).
pub const DEFAULT_QUALITY: u8 = 90;

/// Highest accepted resolution.
pub const MAX_RESOLUTION: u32 = 2400;

/// Neutral value for brightness and saturation (percent).
pub const NEUTRAL_MODULATE: i32 = 100;

/// Upper bound for brightness and saturation (percent).
pub const MAX_MODULATE: i32 = 200;

/// Neutral value for contrast.
pub const NEUTRAL_CONTRAST: i32 = 0;

/// Absolute bound for contrast.
pub const MAX_CONTRAST: i32 = 100;

/// ImageMagick 7 entry point.
pub const MAGICK_PROGRAM: &str = "magick";

/// ImageMagick 6 entry point, used when `magick` is not installed.
pub const LEGACY_MAGICK_PROGRAM: &str = "convert";

/// Poppler tool used to count pages.
pub const PDFINFO_PROGRAM: &str = "pdfinfo";

/// Minimum number of parallel renders regardless of CPU count.
pub const MIN_PARALLELISM: usize = 2;

/// Multiplier applied to CPU core count for default parallelism.
///
/// Renders are CPU-bound in the external tool, so this stays at 1.
pub const PARALLELISM_CORE_MULTIPLIER: usize = 1;

/// Default CPU core count when detection fails.
pub const FALLBACK_CORE_COUNT: usize = 4;

/// Default number of concurrent page renders.
#[must_use]
pub fn default_max_parallel() -> usize {
    let cores = std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(FALLBACK_CORE_COUNT);
    (cores * PARALLELISM_CORE_MULTIPLIER).max(MIN_PARALLELISM)
}

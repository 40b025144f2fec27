//! Cross-platform utilities and helpers
//!
//! # Modules
//!
//! - [`fs`] - Atomic writes, directory creation and directory sizes
//! - [`platform`] - Executable lookup, path expansion and per-user directories
//! - [`progress`] - Progress bar for multi-page renders

pub mod fs;
pub mod platform;
pub mod progress;

pub use fs::{atomic_write, ensure_dir};
pub use platform::{find_program, is_windows, resolve_path};
pub use progress::ProgressBar;

//! File system helpers for the CLI layer.
//!
//! The cache store does its own staging and renames (see
//! [`FilesystemCacheStore`](crate::cache::FilesystemCacheStore)); these
//! helpers cover writing rendered pages to an output directory and sizing
//! the cache for `cache info`.
//!
//! # Modules
//!
//! - `atomic` - write-to-temp-then-rename file writes
//! - `dirs` - directory creation
//! - `metadata` - directory sizes

pub mod atomic;
pub mod dirs;
pub mod metadata;

pub use atomic::atomic_write;
pub use dirs::ensure_dir;
pub use metadata::dir_size;

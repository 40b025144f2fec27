//! Core types for pagecache
//!
//! This module holds the error type shared by every layer of the crate:
//! - [`PageCacheError`] - Enumerated failure modes, including the distinguished
//!   cache-miss condition
//! - [`ErrorContext`] - User-friendly wrapper with details and suggestions
//! - [`user_friendly_error`] - Convert any error into an [`ErrorContext`] for display
//!
//! # Examples
//!
//! ```rust,no_run
//! use pagecache::core::{PageCacheError, user_friendly_error};
//!
//! fn lookup() -> anyhow::Result<()> {
//!     Err(PageCacheError::config("missing required option 'directory'").into())
//! }
//!
//! if let Err(e) = lookup() {
//!     user_friendly_error(e).display();
//! }
//! ```

pub mod error;

pub use error::{ErrorContext, PageCacheError, RenderedBytes, Result, user_friendly_error};

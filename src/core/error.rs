//! Error handling for pagecache
//!
//! This module provides the typed error used throughout the library and the
//! user-facing error reporting used by the CLI. It follows two principles:
//! 1. **Strongly-typed errors** so callers can branch on precise conditions
//!    (most importantly a cache miss, which is a normal control-flow branch)
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Error Categories
//!
//! - **Cache lookups**: [`PageCacheError::CacheMiss`] is the distinguished
//!   not-found condition returned by [`CacheStore::get`](crate::cache::CacheStore::get)
//! - **Corruption**: [`PageCacheError::CacheCorrupted`] when a key's storage location
//!   does not hold exactly one payload file
//! - **Configuration**: [`PageCacheError::InvalidConfig`], [`PageCacheError::InvalidSettings`],
//!   [`PageCacheError::InvalidCacheKey`], [`PageCacheError::UnknownBackend`]
//! - **I/O**: [`PageCacheError::CacheIo`] carries the operation and key that failed
//! - **Rendering**: [`PageCacheError::RendererNotFound`], [`PageCacheError::RenderFailed`],
//!   [`PageCacheError::CacheWriteFailed`]
//! - **Documents**: [`PageCacheError::DocumentNotFound`], [`PageCacheError::PageOutOfRange`],
//!   [`PageCacheError::DocumentInspectFailed`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use pagecache::core::{PageCacheError, user_friendly_error};
//!
//! let error = PageCacheError::UnknownBackend {
//!     requested: "filesytem".to_string(),
//!     available: vec!["filesystem".to_string()],
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with a "did you mean" suggestion
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used by the library layers.
pub type Result<T> = std::result::Result<T, PageCacheError>;

/// Image bytes produced by a render.
///
/// Wrapped so that errors carrying a rendered page don't dump the whole payload
/// when formatted with `{:?}`.
#[derive(Clone, PartialEq, Eq)]
pub struct RenderedBytes(pub Vec<u8>);

impl fmt::Debug for RenderedBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RenderedBytes({} bytes)", self.0.len())
    }
}

/// The main error type for pagecache operations.
///
/// # Not-found is not a failure
///
/// [`CacheMiss`](PageCacheError::CacheMiss) is returned by cache lookups when no
/// entry exists. Callers are expected to branch on it (see
/// [`is_not_found`](PageCacheError::is_not_found)) rather than propagate it.
/// Every other variant is a real failure.
#[derive(Error, Debug)]
pub enum PageCacheError {
    /// No entry is stored under the key
    #[error("No cache entry for key {key}")]
    CacheMiss {
        /// The key that was looked up
        key: String,
    },

    /// The key's storage location exists but is not in a valid state
    #[error("Cache entry {key} is corrupted at {}: {reason}", path.display())]
    CacheCorrupted {
        /// The key whose storage is corrupted
        key: String,
        /// The storage location that failed validation
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// A filesystem operation on the cache failed
    #[error("Cache {operation} failed for key {key} at {}: {source}", path.display())]
    CacheIo {
        /// The operation being performed (e.g. "read", "write", "remove")
        operation: String,
        /// The key involved, or `*` for whole-cache operations
        key: String,
        /// The path the operation touched
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// One or more entries could not be removed while clearing the cache
    #[error("Failed to clear {} cache entr{}: {}", failures.len(), if failures.len() == 1 { "y" } else { "ies" }, failures.join("; "))]
    ClearFailed {
        /// One message per entry that could not be removed
        failures: Vec<String>,
    },

    /// A cache key is not usable as a storage identifier
    #[error("Invalid cache key '{key}': {reason}")]
    InvalidCacheKey {
        /// The rejected key
        key: String,
        /// Why it was rejected
        reason: String,
    },

    /// A cache backend or application configuration is invalid
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with the configuration
        reason: String,
    },

    /// A renderer setting failed validation
    #[error("Invalid renderer setting '{field}': {reason}")]
    InvalidSettings {
        /// The offending field
        field: String,
        /// Why it was rejected
        reason: String,
    },

    /// The configuration names a cache backend nobody registered
    #[error("Unknown cache backend '{requested}' (available: {})", available.join(", "))]
    UnknownBackend {
        /// The backend name from the configuration
        requested: String,
        /// The registered backend names, sorted
        available: Vec<String>,
    },

    /// The page was rendered but could not be written to the cache
    ///
    /// The rendered image is carried in `rendered` so callers can still use it.
    #[error("Rendered page could not be cached under key {key}: {source}")]
    CacheWriteFailed {
        /// The key the page was going to be stored under
        key: String,
        /// The successfully rendered image
        rendered: RenderedBytes,
        /// The cache error that prevented the write
        #[source]
        source: Box<PageCacheError>,
    },

    /// The external rendering or inspection tool is not installed
    #[error("Required program '{program}' was not found in PATH")]
    RendererNotFound {
        /// The program that was looked up
        program: String,
    },

    /// The external renderer ran but did not produce an image
    #[error("Failed to render page {page} of {}: {reason}", document.display())]
    RenderFailed {
        /// The document being rendered
        document: PathBuf,
        /// The 1-indexed page number
        page: u32,
        /// Exit status, stderr or I/O failure description
        reason: String,
    },

    /// The input document does not exist or cannot be resolved
    #[error("Document not found: {}", path.display())]
    DocumentNotFound {
        /// The path as given by the caller
        path: PathBuf,
    },

    /// The page number is outside the document
    #[error("Page {page} is out of range for {} ({page_count} pages)", document.display())]
    PageOutOfRange {
        /// The requested 1-indexed page
        page: u32,
        /// Number of pages in the document
        page_count: u32,
        /// The document path
        document: PathBuf,
    },

    /// The page count of a document could not be determined
    #[error("Failed to inspect {}: {reason}", document.display())]
    DocumentInspectFailed {
        /// The document path
        document: PathBuf,
        /// Exit status, stderr or parse failure description
        reason: String,
    },
}

impl PageCacheError {
    /// Whether this is the distinguished cache-miss condition.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::CacheMiss { .. })
    }

    /// Whether this is a corruption report.
    #[must_use]
    pub const fn is_corruption(&self) -> bool {
        matches!(self, Self::CacheCorrupted { .. })
    }

    /// Build a [`CacheIo`](Self::CacheIo) error.
    pub fn io(
        operation: impl Into<String>,
        key: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::CacheIo {
            operation: operation.into(),
            key: key.into(),
            path: path.into(),
            source,
        }
    }

    /// Build an [`InvalidConfig`](Self::InvalidConfig) error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Build an [`InvalidSettings`](Self::InvalidSettings) error.
    pub fn settings(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSettings {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error wrapper that adds user-facing details and a suggestion.
///
/// Produced by [`user_friendly_error`] and printed by the CLI entry point.
#[derive(Debug)]
pub struct ErrorContext {
    /// The main error message
    pub message: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with just a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    ///
    /// Suggestions are displayed in green in the terminal.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    ///
    /// Details are displayed in yellow in the terminal.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details and suggestion to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.message);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into a user-friendly [`ErrorContext`].
///
/// Recognizes [`PageCacheError`] variants (anywhere in the error chain) and
/// [`std::io::Error`] kinds and attaches tailored suggestions. Anything else is
/// reported with its full context chain.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let message = format!("{error:#}");

    for cause in error.chain() {
        if let Some(err) = cause.downcast_ref::<PageCacheError>() {
            return describe(err, message);
        }
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(message)
                    .with_suggestion("Check ownership and permissions of the file or directory");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(message)
                    .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    ErrorContext::new(message)
}

fn describe(error: &PageCacheError, message: String) -> ErrorContext {
    let ctx = ErrorContext::new(message);
    match error {
        PageCacheError::CacheCorrupted { key, .. } => ctx
            .with_details("Each key directory must contain exactly one payload file")
            .with_suggestion(format!("Run 'pagecache cache invalidate {key}' to drop the entry")),
        PageCacheError::CacheIo { source, .. } => match source.kind() {
            std::io::ErrorKind::PermissionDenied => ctx
                .with_suggestion("Check permissions of the cache directory or point 'directory' elsewhere"),
            _ => ctx.with_details("The cache directory may be on a full or read-only filesystem"),
        },
        PageCacheError::UnknownBackend { requested, available } => {
            let closest = available
                .iter()
                .map(|name| (strsim::levenshtein(requested, name), name))
                .filter(|(distance, _)| *distance <= 3)
                .min_by_key(|(distance, _)| *distance);
            match closest {
                Some((_, name)) => ctx.with_suggestion(format!("Did you mean '{name}'?")),
                None => ctx.with_suggestion("Run 'pagecache backends' to list registered backends"),
            }
        }
        PageCacheError::InvalidConfig { .. } => ctx
            .with_suggestion("Check the config file passed with --config or set in PAGECACHE_CONFIG"),
        PageCacheError::RendererNotFound { program } => ctx
            .with_details(format!("'{program}' is needed to render or inspect documents"))
            .with_suggestion("Install ImageMagick and poppler-utils, or set 'program' in the renderer config"),
        PageCacheError::PageOutOfRange { page_count, .. } => {
            ctx.with_suggestion(format!("Choose pages between 1 and {page_count}"))
        }
        PageCacheError::CacheWriteFailed { .. } => ctx
            .with_details("The page was rendered but the cache could not store it")
            .with_suggestion("Fix the cache directory or rerun with --no-cache"),
        PageCacheError::RenderFailed { .. } => ctx
            .with_suggestion("Rerun with --verbose to see the renderer command line"),
        _ => ctx,
    }
}

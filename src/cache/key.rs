//! Cache key derivation for rendered pages.
//!
//! A key is derived in two steps:
//!
//! 1. [`RenderParameters`] formats the full request into a canonical string
//!    of the form
//!    `<document>/<page>.<format>?resolution=<r>&quality=<q>&<extra>...`.
//!    Mandatory parameters come first in a fixed order, followed by the
//!    renderer's extra parameters exactly as the renderer listed them.
//! 2. [`derive_key`] hashes that string with SHA-256 and hex-encodes the
//!    digest, giving a 64-character opaque identifier.
//!
//! Optional filters that are not set never appear in the canonical string, so
//! "no brightness filter" and "brightness explicitly 100" hash differently.
//!
//! # Examples
//!
//! ```rust
//! use pagecache::cache::key::RenderParameters;
//! use pagecache::renderer::{BaseSettings, ImageFormat};
//! use std::path::Path;
//!
//! let base = BaseSettings { format: ImageFormat::Png, resolution: 150, quality: 90 };
//! let extra = vec!["brightness=120".to_string()];
//! let params = RenderParameters::new(Path::new("/docs/report.pdf"), 3, &base, &extra);
//!
//! assert_eq!(
//!     params.canonical_string(),
//!     "/docs/report.pdf/3.png?resolution=150&quality=90&brightness=120"
//! );
//! assert_eq!(params.key().len(), 64);
//! ```

use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

use crate::renderer::BaseSettings;

/// Length of a derived key in hex characters.
pub const KEY_LENGTH: usize = 64;

/// Everything that determines the bytes of a rendered page.
///
/// Borrowed view over the request; cheap to build per lookup.
#[derive(Debug, Clone, Copy)]
pub struct RenderParameters<'a> {
    document: &'a Path,
    page: u32,
    base: &'a BaseSettings,
    extra: &'a [String],
}

impl<'a> RenderParameters<'a> {
    /// Bundle a request. `document` should already be canonical and absolute.
    #[must_use]
    pub const fn new(
        document: &'a Path,
        page: u32,
        base: &'a BaseSettings,
        extra: &'a [String],
    ) -> Self {
        Self {
            document,
            page,
            base,
            extra,
        }
    }

    /// The canonical, pre-hash encoding of the request.
    #[must_use]
    pub fn canonical_string(&self) -> String {
        self.to_string()
    }

    /// The SHA-256 cache key of the canonical string.
    #[must_use]
    pub fn key(&self) -> String {
        derive_key(&self.canonical_string())
    }
}

impl fmt::Display for RenderParameters<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}.{}?resolution={}&quality={}",
            self.document.display(),
            self.page,
            self.base.format.extension(),
            self.base.resolution,
            self.base.quality
        )?;
        for param in self.extra {
            write!(f, "&{param}")?;
        }
        Ok(())
    }
}

/// Hash a canonical parameter string into a hex-encoded SHA-256 key.
#[must_use]
pub fn derive_key(canonical: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

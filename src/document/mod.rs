//! Input documents and page references.
//!
//! Documents are treated as opaque: the only thing pagecache needs from one is
//! its canonical path and its page count. The page count comes from a
//! [`PageCountProvider`]; [`PdfInfo`] is the default provider and runs
//! poppler's `pdfinfo`.

pub mod pdfinfo;

pub use pdfinfo::PdfInfo;

use std::path::{Path, PathBuf};

use crate::core::{PageCacheError, Result};

/// Source of page counts for documents.
pub trait PageCountProvider: Send + Sync {
    /// Number of pages in the document at `path`.
    fn page_count(&self, path: &Path) -> Result<u32>;
}

/// A single page of a document: canonical path plus 1-indexed page number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageRef {
    document: PathBuf,
    page: u32,
}

impl PageRef {
    /// Creates a page reference without checking bounds.
    ///
    /// `document` should be canonical and absolute; use [`Document::page`] to
    /// get a bounds-checked reference, or [`PageRef::resolve`] to canonicalize.
    pub fn new(document: impl Into<PathBuf>, page: u32) -> Self {
        Self {
            document: document.into(),
            page,
        }
    }

    /// Canonicalizes `path` and pairs it with `page` without counting pages.
    ///
    /// # Errors
    ///
    /// [`PageCacheError::DocumentNotFound`] when the path cannot be resolved,
    /// [`PageCacheError::PageOutOfRange`] for page 0.
    pub fn resolve(path: &Path, page: u32) -> Result<Self> {
        let document = canonical_document(path)?;
        if page == 0 {
            return Err(PageCacheError::PageOutOfRange {
                page,
                page_count: 0,
                document,
            });
        }
        Ok(Self::new(document, page))
    }

    /// The document path.
    #[must_use]
    pub fn document(&self) -> &Path {
        &self.document
    }

    /// The 1-indexed page number.
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.page
    }

    /// Suggested file name for the rendered page: `<stem>-<page>.<extension>`.
    #[must_use]
    pub fn file_name(&self, extension: &str) -> String {
        let stem = self
            .document
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "document".to_string());
        format!("{stem}-{}.{extension}", self.page)
    }
}

/// An opened document with a known page count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: PathBuf,
    page_count: u32,
}

impl Document {
    /// Canonicalizes `path` and asks `provider` for its page count.
    pub fn open(path: &Path, provider: &dyn PageCountProvider) -> Result<Self> {
        let path = canonical_document(path)?;
        let page_count = provider.page_count(&path)?;
        tracing::debug!("Opened {} ({page_count} pages)", path.display());
        Ok(Self { path, page_count })
    }

    /// Canonical absolute path of the document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of pages.
    #[must_use]
    pub const fn page_count(&self) -> u32 {
        self.page_count
    }

    /// A bounds-checked reference to page `page` (1-indexed).
    pub fn page(&self, page: u32) -> Result<PageRef> {
        if page == 0 || page > self.page_count {
            return Err(PageCacheError::PageOutOfRange {
                page,
                page_count: self.page_count,
                document: self.path.clone(),
            });
        }
        Ok(PageRef::new(self.path.clone(), page))
    }

    /// References to every page in order.
    #[must_use]
    pub fn pages(&self) -> Vec<PageRef> {
        (1..=self.page_count)
            .map(|page| PageRef::new(self.path.clone(), page))
            .collect()
    }
}

fn canonical_document(path: &Path) -> Result<PathBuf> {
    let canonical = path.canonicalize().map_err(|_| PageCacheError::DocumentNotFound {
        path: path.to_path_buf(),
    })?;
    if !canonical.is_file() {
        return Err(PageCacheError::DocumentNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(canonical)
}

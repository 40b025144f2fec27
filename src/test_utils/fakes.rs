//! Stand-ins for the external collaborators.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::cache::{CacheEntry, CacheEntryInfo, CacheStore};
use crate::core::{PageCacheError, Result};
use crate::document::PageCountProvider;
use crate::renderer::{Renderer, RendererSettings};

/// Bytes [`CountingRenderer`] produces for a page.
///
/// Large enough that a truncated write would be noticed.
#[must_use]
pub fn fake_page_bytes(document: &Path, page: u32) -> Vec<u8> {
    let header = format!("FAKE-PAGE {} #{page}\n", document.display());
    let mut bytes = header.into_bytes();
    bytes.extend((0..64 * 1024).map(|i| (i % 251) as u8 ^ page as u8));
    bytes
}

/// Renderer that writes [`fake_page_bytes`] and counts invocations.
#[derive(Debug, Default)]
pub struct CountingRenderer {
    settings: RendererSettings,
    calls: AtomicUsize,
    fail: bool,
}

impl CountingRenderer {
    pub fn new(settings: RendererSettings) -> Self {
        Self {
            settings,
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    /// A renderer whose every invocation fails with `RenderFailed`.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Number of times a page was rendered.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Renderer for CountingRenderer {
    fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    fn render_to(&self, document: &Path, page: u32, output: &Path) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PageCacheError::RenderFailed {
                document: document.to_path_buf(),
                page,
                reason: "fake renderer configured to fail".to_string(),
            });
        }
        std::fs::write(output, fake_page_bytes(document, page)).map_err(|e| {
            PageCacheError::RenderFailed {
                document: document.to_path_buf(),
                page,
                reason: e.to_string(),
            }
        })
    }
}

/// Cache store that always misses and never accepts writes.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingStore;

impl CacheStore for FailingStore {
    fn get(&self, key: &str) -> Result<CacheEntry> {
        Err(PageCacheError::CacheMiss {
            key: key.to_string(),
        })
    }

    fn set(&self, entry: &CacheEntry) -> Result<()> {
        Err(PageCacheError::io(
            "write",
            &entry.key,
            PathBuf::from("/read-only").join(&entry.key),
            std::io::Error::new(ErrorKind::PermissionDenied, "read-only cache"),
        ))
    }

    fn invalidate(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        Ok(())
    }

    fn entries(&self) -> Result<Vec<CacheEntryInfo>> {
        Ok(Vec::new())
    }

    fn location(&self) -> String {
        "/read-only".to_string()
    }
}

/// Page-count provider that reports the same count for every document.
#[derive(Debug, Clone, Copy)]
pub struct FixedPageCount(pub u32);

impl PageCountProvider for FixedPageCount {
    fn page_count(&self, _path: &Path) -> Result<u32> {
        Ok(self.0)
    }
}

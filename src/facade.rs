//! Cache-or-render orchestration.
//!
//! [`RenderingFacade`] is the single place that decides whether a page comes
//! from the cache or from the renderer:
//!
//! 1. Without a cache, render and return.
//! 2. Derive the key from the page and the renderer's settings.
//! 3. On a hit, return the stored bytes; the renderer is not invoked.
//! 4. On a miss, render, then store the result under the key.
//!
//! Lookup failures other than a miss abort the request: a broken cache is
//! never treated as an empty one.
//!
//! # Cache write failures
//!
//! When the page renders but cannot be stored, the facade returns
//! [`PageCacheError::CacheWriteFailed`] carrying the rendered bytes. The
//! caller decides whether to use the image anyway, but can never miss the
//! fact that the cache is not working.

use std::sync::Arc;

use crate::cache::{CacheEntry, CacheStore, RenderParameters};
use crate::core::{PageCacheError, RenderedBytes, Result};
use crate::document::PageRef;
use crate::renderer::Renderer;

/// Where the bytes of a [`RenderedPage`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSource {
    /// Served from the cache
    Cache,
    /// Rendered and stored in the cache
    Rendered,
    /// Rendered with caching disabled
    Uncached,
}

/// A rendered page plus how it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// Image bytes
    pub data: Vec<u8>,
    /// Suggested file name, `<stem>-<page>.<ext>`
    pub filename: String,
    /// Cache key, `None` when caching is disabled
    pub key: Option<String>,
    pub source: PageSource,
}

/// Ties an optional cache to a renderer.
#[derive(Clone, Default)]
pub struct RenderingFacade {
    cache: Option<Arc<dyn CacheStore>>,
}

impl std::fmt::Debug for RenderingFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderingFacade")
            .field("cache", &self.cache.as_ref().map(|c| c.location()))
            .finish()
    }
}

impl RenderingFacade {
    /// A facade backed by `cache`; `None` disables caching.
    #[must_use]
    pub fn new(cache: Option<Arc<dyn CacheStore>>) -> Self {
        Self { cache }
    }

    /// A facade that always renders.
    #[must_use]
    pub fn uncached() -> Self {
        Self::default()
    }

    /// The key `page` is cached under when rendered by `renderer`.
    #[must_use]
    pub fn cache_key(page: &PageRef, renderer: &dyn Renderer) -> String {
        let extra = renderer.extra_parameters();
        RenderParameters::new(
            page.document(),
            page.number(),
            renderer.settings().base(),
            &extra,
        )
        .key()
    }

    /// Returns the image bytes for `page`, from the cache when possible.
    ///
    /// See [`render_page`](Self::render_page) for the error contract.
    pub fn render(&self, page: &PageRef, renderer: &dyn Renderer) -> Result<Vec<u8>> {
        self.render_page(page, renderer).map(|rendered| rendered.data)
    }

    /// Like [`render`](Self::render), also reporting where the bytes came from.
    ///
    /// # Errors
    ///
    /// - any cache lookup error other than [`PageCacheError::CacheMiss`],
    ///   without invoking the renderer
    /// - renderer errors
    /// - [`PageCacheError::CacheWriteFailed`] when the page rendered but could
    ///   not be stored; the error carries the rendered bytes
    pub fn render_page(&self, page: &PageRef, renderer: &dyn Renderer) -> Result<RenderedPage> {
        let filename = page.file_name(renderer.settings().base().format.extension());

        let Some(cache) = &self.cache else {
            let data = renderer.render(page)?;
            tracing::info!("Rendered {filename} (caching disabled)");
            return Ok(RenderedPage {
                data,
                filename,
                key: None,
                source: PageSource::Uncached,
            });
        };

        let key = Self::cache_key(page, renderer);

        match cache.get(&key) {
            Ok(entry) => {
                tracing::debug!("Cache hit for {filename} ({key})");
                return Ok(RenderedPage {
                    data: entry.data,
                    filename,
                    key: Some(key),
                    source: PageSource::Cache,
                });
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!("Cache miss for {filename} ({key})");
            }
            Err(e) => return Err(e),
        }

        let data = renderer.render(page)?;
        tracing::info!("Rendered {filename}");

        let entry = CacheEntry::new(key, data, filename);
        if let Err(source) = cache.set(&entry) {
            tracing::warn!("Failed to cache {}: {source}", entry.filename);
            return Err(PageCacheError::CacheWriteFailed {
                key: entry.key,
                rendered: RenderedBytes(entry.data),
                source: Box::new(source),
            });
        }

        Ok(RenderedPage {
            data: entry.data,
            filename: entry.filename,
            key: Some(entry.key),
            source: PageSource::Rendered,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FilesystemCacheStore;
    use crate::test_utils::{CountingRenderer, FailingStore, fake_page_bytes};
    use tempfile::TempDir;

    fn cached_facade(temp: &TempDir) -> (RenderingFacade, Arc<FilesystemCacheStore>) {
        let store = Arc::new(FilesystemCacheStore::new(temp.path().join("cache")).unwrap());
        let facade = RenderingFacade::new(Some(store.clone() as Arc<dyn CacheStore>));
        (facade, store)
    }

    #[test]
    fn test_miss_then_hit_renders_once() {
        let temp = TempDir::new().unwrap();
        let (facade, _store) = cached_facade(&temp);
        let renderer = CountingRenderer::default();
        let page = PageRef::new("/docs/report.pdf", 2);

        let first = facade.render_page(&page, &renderer).unwrap();
        let second = facade.render_page(&page, &renderer).unwrap();

        assert_eq!(first.source, PageSource::Rendered);
        assert_eq!(second.source, PageSource::Cache);
        assert_eq!(first.data, second.data);
        assert_eq!(first.data, fake_page_bytes(page.document(), 2));
        assert_eq!(first.filename, "report-2.png");
        assert_eq!(renderer.calls(), 1);
    }

    #[test]
    fn test_uncached_always_renders() {
        let facade = RenderingFacade::uncached();
        let renderer = CountingRenderer::default();
        let page = PageRef::new("/docs/report.pdf", 1);

        for _ in 0..3 {
            let rendered = facade.render_page(&page, &renderer).unwrap();
            assert_eq!(rendered.source, PageSource::Uncached);
            assert!(rendered.key.is_none());
        }
        assert_eq!(renderer.calls(), 3);
    }

    #[test]
    fn test_key_depends_on_extra_parameters() {
        let page = PageRef::new("/docs/report.pdf", 1);
        let plain = CountingRenderer::default();
        let brightened = CountingRenderer::new(
            crate::renderer::RendererSettingsBuilder {
                brightness: Some(100),
                ..Default::default()
            }
            .build()
            .unwrap(),
        );

        assert_ne!(
            RenderingFacade::cache_key(&page, &plain),
            RenderingFacade::cache_key(&page, &brightened)
        );
    }

    #[test]
    fn test_corrupted_entry_propagates_without_rendering() {
        let temp = TempDir::new().unwrap();
        let (facade, store) = cached_facade(&temp);
        let renderer = CountingRenderer::default();
        let page = PageRef::new("/docs/report.pdf", 1);

        let key = RenderingFacade::cache_key(&page, &renderer);
        std::fs::create_dir_all(store.key_dir(&key).join("nested")).unwrap();

        let err = facade.render(&page, &renderer).unwrap_err();
        assert!(err.is_corruption(), "unexpected error: {err}");
        assert_eq!(renderer.calls(), 0);
    }

    #[test]
    fn test_cache_write_failure_carries_rendered_bytes() {
        let facade = RenderingFacade::new(Some(Arc::new(FailingStore) as Arc<dyn CacheStore>));
        let renderer = CountingRenderer::default();
        let page = PageRef::new("/docs/report.pdf", 3);

        match facade.render(&page, &renderer) {
            Err(PageCacheError::CacheWriteFailed {
                key,
                rendered,
                source,
            }) => {
                assert_eq!(key, RenderingFacade::cache_key(&page, &renderer));
                assert_eq!(rendered.0, fake_page_bytes(page.document(), 3));
                assert!(matches!(*source, PageCacheError::CacheIo { .. }));
            }
            other => panic!("expected CacheWriteFailed, got {other:?}"),
        }
        assert_eq!(renderer.calls(), 1);
    }

    #[test]
    fn test_render_errors_are_not_cached() {
        let temp = TempDir::new().unwrap();
        let (facade, store) = cached_facade(&temp);
        let renderer = CountingRenderer::failing();
        let page = PageRef::new("/docs/report.pdf", 1);

        let err = facade.render(&page, &renderer).unwrap_err();
        assert!(matches!(err, PageCacheError::RenderFailed { .. }));
        assert!(store.entries().unwrap().is_empty());
    }
}

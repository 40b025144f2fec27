use pagecache::cache::CacheStore;
use pagecache::core::PageCacheError;
use pagecache::document::{Document, PageRef};
use pagecache::facade::{PageSource, RenderingFacade};
use pagecache::renderer::RendererSettingsBuilder;
use pagecache::test_utils::{CountingRenderer, FixedPageCount, fake_page_bytes};
use std::sync::Arc;

use crate::common::TestEnvironment;

#[test]
fn test_miss_then_hit_skips_renderer() {
    let env = TestEnvironment::new().unwrap();
    let facade = RenderingFacade::new(Some(env.store()));
    let renderer = CountingRenderer::default();
    let page = PageRef::new(env.document(), 1);

    let first = facade.render(&page, &renderer).unwrap();
    assert_eq!(renderer.calls(), 1);

    let second = facade.render(&page, &renderer).unwrap();
    assert_eq!(renderer.calls(), 1);
    assert_eq!(first, second);
    assert_eq!(second, fake_page_bytes(env.document(), 1));
}

#[test]
fn test_two_pages_get_two_keys_and_two_directories() {
    let env = TestEnvironment::new().unwrap();
    let facade = RenderingFacade::new(Some(env.store()));
    let renderer = CountingRenderer::default();
    let document = Document::open(env.document(), &FixedPageCount(2)).unwrap();

    let keys: Vec<String> = document
        .pages()
        .iter()
        .map(|page| facade.render_page(page, &renderer).unwrap().key.unwrap())
        .collect();

    assert_ne!(keys[0], keys[1]);
    let mut expected = keys.clone();
    expected.sort();
    assert_eq!(env.cache_children().unwrap(), expected);

    let store = env.filesystem_store();
    assert_eq!(store.get(&keys[0]).unwrap().filename, "report-1.png");
    assert_eq!(store.get(&keys[1]).unwrap().filename, "report-2.png");
}

#[test]
fn test_settings_change_is_a_miss() {
    let env = TestEnvironment::new().unwrap();
    let facade = RenderingFacade::new(Some(env.store()));
    let page = PageRef::new(env.document(), 1);

    let png = CountingRenderer::default();
    let jpeg = CountingRenderer::new(
        RendererSettingsBuilder {
            format: Some("jpeg".to_string()),
            ..Default::default()
        }
        .build()
        .unwrap(),
    );

    facade.render(&page, &png).unwrap();
    let rendered = facade.render_page(&page, &jpeg).unwrap();

    assert_eq!(rendered.source, PageSource::Rendered);
    assert_eq!(rendered.filename, "report-1.jpg");
    assert_eq!(jpeg.calls(), 1);
    assert_eq!(env.cache_children().unwrap().len(), 2);
}

#[test]
fn test_invalidate_forces_rerender() {
    let env = TestEnvironment::new().unwrap();
    let store = env.store();
    let facade = RenderingFacade::new(Some(Arc::clone(&store)));
    let renderer = CountingRenderer::default();
    let page = PageRef::new(env.document(), 1);

    let rendered = facade.render_page(&page, &renderer).unwrap();
    store.invalidate(&rendered.key.unwrap()).unwrap();
    facade.render(&page, &renderer).unwrap();

    assert_eq!(renderer.calls(), 2);
}

#[test]
fn test_corrupted_entry_is_reported_not_rerendered() {
    let env = TestEnvironment::new().unwrap();
    let facade = RenderingFacade::new(Some(env.store()));
    let renderer = CountingRenderer::default();
    let page = PageRef::new(env.document(), 1);

    let key = facade.render_page(&page, &renderer).unwrap().key.unwrap();
    std::fs::write(env.cache_dir.join(&key).join("second.png"), b"x").unwrap();

    let err = facade.render(&page, &renderer).unwrap_err();
    assert!(matches!(err, PageCacheError::CacheCorrupted { .. }));
    assert_eq!(renderer.calls(), 1);
}

#[test]
fn test_parallel_requests_for_same_page_all_succeed() {
    let env = TestEnvironment::new().unwrap();
    let facade = RenderingFacade::new(Some(env.store()));
    let renderer = CountingRenderer::default();
    let page = PageRef::new(env.document(), 3);

    std::thread::scope(|s| {
        for _ in 0..10 {
            let facade = &facade;
            let renderer = &renderer;
            let page = &page;
            s.spawn(move || {
                let bytes = facade.render(page, renderer).unwrap();
                assert_eq!(bytes, fake_page_bytes(page.document(), 3));
            });
        }
    });

    // No single-flight: redundant renders are allowed, but at least one happened
    assert!((1..=10).contains(&renderer.calls()));
    assert_eq!(env.cache_children().unwrap().len(), 1);
}

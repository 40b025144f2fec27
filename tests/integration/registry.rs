use pagecache::cache::{CacheConfig, CacheEntry, CacheRegistry, CacheStore, derive_key};
use pagecache::config::Config;
use pagecache::core::PageCacheError;
use serial_test::serial;

use crate::common::TestEnvironment;

#[test]
fn test_store_from_config_file() {
    let env = TestEnvironment::new().unwrap();
    let path = env.write_config(serde_json::json!({"format": "webp"})).unwrap();

    let config = Config::load_from(&path).unwrap();
    let cache_config = config.cache_config().unwrap().unwrap();
    let store = CacheRegistry::with_builtin_backends()
        .create(&cache_config)
        .unwrap();

    let key = derive_key("from-config");
    store
        .set(&CacheEntry::new(key.clone(), b"webp".to_vec(), "report-1.webp"))
        .unwrap();
    assert!(env.cache_dir.join(&key).join("report-1.webp").is_file());
}

#[test]
#[serial]
fn test_directory_option_is_expanded() {
    let env = TestEnvironment::new().unwrap();
    let nested = env.temp_dir.path().join("expanded/cache");

    // SAFETY: serialized, and only this test reads the variable
    unsafe {
        std::env::set_var("PAGECACHE_TEST_CACHE_ROOT", env.temp_dir.path());
    }
    let store = CacheRegistry::with_builtin_backends()
        .create(&CacheConfig::filesystem(
            "$PAGECACHE_TEST_CACHE_ROOT/expanded/cache",
        ))
        .unwrap();

    assert!(nested.is_dir());
    assert_eq!(store.location(), nested.display().to_string());
}

#[test]
fn test_missing_directory_option_fails_fast() {
    let config: CacheConfig = serde_json::from_str(r#"{"type": "filesystem"}"#).unwrap();
    let err = CacheRegistry::with_builtin_backends()
        .create(&config)
        .err()
        .unwrap();
    assert!(matches!(err, PageCacheError::InvalidConfig { .. }));
}

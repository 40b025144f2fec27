use pagecache::cache::{CacheEntry, CacheStore, FilesystemCacheStore, derive_key};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::common::TestEnvironment;

fn payload(writer: u8) -> Vec<u8> {
    // Large enough that a torn write would show up
    vec![writer; 256 * 1024]
}

#[test]
fn test_concurrent_set_same_key_leaves_complete_payload() {
    let env = TestEnvironment::new().unwrap();
    let store = env.filesystem_store();
    let key = derive_key("concurrent");

    std::thread::scope(|s| {
        for writer in 0..10u8 {
            let store = &store;
            let key = &key;
            s.spawn(move || {
                store
                    .set(&CacheEntry::new(key.clone(), payload(writer), "report-1.png"))
                    .unwrap();
            });
        }
    });

    let entry = store.get(&key).unwrap();
    assert_eq!(entry.data.len(), 256 * 1024);
    let first = entry.data[0];
    assert!(first < 10);
    assert!(entry.data.iter().all(|b| *b == first), "payload mixes writers");

    // Exactly the key directory, no staging leftovers
    assert_eq!(env.cache_children().unwrap(), vec![key.clone()]);
    assert_eq!(fs::read_dir(store.key_dir(&key)).unwrap().count(), 1);
}

#[test]
fn test_readers_never_observe_partial_writes() {
    let env = TestEnvironment::new().unwrap();
    let store = env.filesystem_store();
    let key = derive_key("readers");
    store
        .set(&CacheEntry::new(key.clone(), payload(0), "report-1.png"))
        .unwrap();

    std::thread::scope(|s| {
        for writer in 1..=4u8 {
            let store = &store;
            let key = &key;
            s.spawn(move || {
                for _ in 0..10 {
                    store
                        .set(&CacheEntry::new(key.clone(), payload(writer), "report-1.png"))
                        .unwrap();
                }
            });
        }
        for _ in 0..4 {
            let store = &store;
            let key = &key;
            s.spawn(move || {
                for _ in 0..50 {
                    let entry = store.get(key).unwrap();
                    assert_eq!(entry.data.len(), 256 * 1024);
                    let first = entry.data[0];
                    assert!(entry.data.iter().all(|b| *b == first));
                }
            });
        }
    });
}

#[test]
fn test_different_keys_do_not_interfere() {
    let env = TestEnvironment::new().unwrap();
    let store = env.filesystem_store();

    std::thread::scope(|s| {
        for n in 0..8u8 {
            let store = &store;
            s.spawn(move || {
                let key = derive_key(&format!("page-{n}"));
                store
                    .set(&CacheEntry::new(key.clone(), vec![n; 1024], format!("doc-{n}.png")))
                    .unwrap();
                assert_eq!(store.get(&key).unwrap().data, vec![n; 1024]);
            });
        }
    });

    assert_eq!(store.entries().unwrap().len(), 8);
}

#[test]
fn test_clear_removes_key_directories_and_keeps_stray_file() {
    let env = TestEnvironment::new().unwrap();
    let store = env.filesystem_store();
    let keys: Vec<String> = (0..3).map(|n| derive_key(&format!("clear-{n}"))).collect();
    for key in &keys {
        store
            .set(&CacheEntry::new(key.clone(), b"png".to_vec(), "page.png"))
            .unwrap();
    }
    let stray = env.cache_dir.join("notes.txt");
    fs::write(&stray, "not a cache entry").unwrap();

    store.clear().unwrap();

    assert_eq!(env.cache_children().unwrap(), vec!["notes.txt".to_string()]);
    assert_eq!(fs::read_to_string(&stray).unwrap(), "not a cache entry");
    for key in &keys {
        assert!(store.get(key).unwrap_err().is_not_found());
    }
}

#[test]
fn test_store_reopened_sees_existing_entries() {
    let env = TestEnvironment::new().unwrap();
    let key = derive_key("persist");
    env.filesystem_store()
        .set(&CacheEntry::new(key.clone(), b"bytes".to_vec(), "report-1.png"))
        .unwrap();

    let reopened = FilesystemCacheStore::new(&env.cache_dir).unwrap();
    let entry = reopened.get(&key).unwrap();
    assert_eq!(entry.data, b"bytes");
    assert_eq!(entry.filename, "report-1.png");
}

#[test]
fn test_clear_concurrent_with_sets_on_other_keys() {
    let env = TestEnvironment::new().unwrap();
    let store = env.filesystem_store();
    let done = AtomicBool::new(false);

    std::thread::scope(|s| {
        let store = &store;
        let done = &done;
        s.spawn(move || {
            while !done.load(Ordering::Acquire) {
                store.clear().unwrap();
            }
        });

        for n in 0..400u32 {
            let key = derive_key(&format!("busy-{n}"));
            let result = store.set(&CacheEntry::new(key, vec![1; 512], "page.png"));
            if let Err(e) = result {
                done.store(true, Ordering::Release);
                panic!("set {n} failed while clearing: {e}");
            }
        }
        done.store(true, Ordering::Release);
    });

    store.clear().unwrap();
    assert!(env.cache_children().unwrap().is_empty());
}


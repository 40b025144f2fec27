use pagecache::cache::{CacheEntry, CacheStore, derive_key};
use predicates::prelude::*;
use std::fs;

use crate::common::{TestEnvironment, pagecache_cmd, pagecache_with_config};

fn key_output(env: &TestEnvironment, extra: &[&str]) -> String {
    let output = pagecache_with_config(env)
        .unwrap()
        .args(["key", "report.pdf"])
        .args(extra)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn test_backends_lists_filesystem() {
    let env = TestEnvironment::new().unwrap();
    pagecache_cmd(&env)
        .arg("backends")
        .assert()
        .success()
        .stdout("filesystem\n");
}

#[test]
fn test_key_is_stable_and_page_sensitive() {
    let env = TestEnvironment::new().unwrap();

    let first = key_output(&env, &["--page", "2"]);
    let again = key_output(&env, &["--page", "2"]);
    let other_page = key_output(&env, &["--page", "3"]);

    assert_eq!(first, again);
    assert_ne!(first, other_page);
    let key = first.trim();
    assert_eq!(key.len(), 64);
    assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn test_key_canonical_string() {
    let env = TestEnvironment::new().unwrap();
    let output = key_output(&env, &["--page", "2", "--canonical", "--brightness", "100"]);
    let lines: Vec<&str> = output.lines().collect();

    let expected = format!(
        "{}/2.png?resolution=150&quality=90&brightness=100",
        env.document().display()
    );
    assert_eq!(lines, vec![expected.as_str(), derive_key(&expected).as_str()]);
}

#[test]
fn test_key_distinguishes_neutral_filter_from_absent() {
    let env = TestEnvironment::new().unwrap();
    let absent = key_output(&env, &["--page", "1"]);
    let neutral = key_output(&env, &["--page", "1", "--contrast", "0"]);
    assert_ne!(absent, neutral);
}

#[test]
fn test_key_uses_config_renderer_settings() {
    let env = TestEnvironment::new().unwrap();
    let config = env
        .write_config(serde_json::json!({"format": "jpeg", "quality": 70}))
        .unwrap();

    pagecache_cmd(&env)
        .args(["--config"])
        .arg(&config)
        .args(["key", "report.pdf", "--page", "1", "--canonical"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/1.jpg?resolution=150&quality=70"));
}

#[test]
fn test_key_for_missing_document_fails() {
    let env = TestEnvironment::new().unwrap();
    pagecache_with_config(&env)
        .unwrap()
        .args(["key", "missing.pdf", "--page", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Document not found"));
}

#[test]
fn test_invalid_setting_is_rejected() {
    let env = TestEnvironment::new().unwrap();
    pagecache_with_config(&env)
        .unwrap()
        .args(["key", "report.pdf", "--page", "1", "--quality", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("quality"));
}

#[test]
fn test_cache_list_info_invalidate_and_clear() {
    let env = TestEnvironment::new().unwrap();
    let store = env.filesystem_store();
    let keys: Vec<String> = (1..=3).map(|n| derive_key(&format!("cli-{n}"))).collect();
    for (n, key) in keys.iter().enumerate() {
        store
            .set(&CacheEntry::new(key.clone(), vec![0u8; 10], format!("report-{}.png", n + 1)))
            .unwrap();
    }
    fs::write(env.cache_dir.join("README"), "stray").unwrap();

    let output = pagecache_with_config(&env)
        .unwrap()
        .args(["cache", "list", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 3);
    assert_eq!(listed[0]["size"], 10);

    pagecache_with_config(&env)
        .unwrap()
        .args(["cache", "info"])
        .assert()
        .success()
        .stdout(predicate::str::contains("filesystem"))
        .stdout(predicate::str::contains("Entries:  3"));

    pagecache_with_config(&env)
        .unwrap()
        .args(["cache", "invalidate", &keys[0]])
        .assert()
        .success();
    assert!(store.get(&keys[0]).unwrap_err().is_not_found());

    pagecache_with_config(&env)
        .unwrap()
        .args(["cache", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 2"));

    assert_eq!(env.cache_children().unwrap(), vec!["README".to_string()]);
}

#[test]
fn test_cache_commands_fail_when_caching_disabled() {
    let env = TestEnvironment::new().unwrap();
    let config = env.temp_dir.path().join("disabled.json");
    fs::write(&config, r#"{"cache": null}"#).unwrap();

    pagecache_cmd(&env)
        .arg("--config")
        .arg(&config)
        .args(["cache", "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("disabled"));
}

#[test]
fn test_unknown_backend_suggests_closest_name() {
    let env = TestEnvironment::new().unwrap();
    let config = env.temp_dir.path().join("typo.json");
    fs::write(
        &config,
        r#"{"cache": {"type": "filesytem", "options": {"directory": "cache"}}}"#,
    )
    .unwrap();

    pagecache_cmd(&env)
        .arg("--config")
        .arg(&config)
        .args(["cache", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("filesytem"))
        .stderr(predicate::str::contains("Did you mean 'filesystem'?"));
}

#[test]
fn test_render_missing_document_fails() {
    let env = TestEnvironment::new().unwrap();
    pagecache_with_config(&env)
        .unwrap()
        .args(["render", "missing.pdf", "--program", "/bin/true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Document not found"));
}

#[cfg(unix)]
mod end_to_end {
    use super::*;
    use crate::common::FakeTools;

    fn render(env: &TestEnvironment, tools: &FakeTools, extra: &[&str]) -> assert_cmd::assert::Assert {
        pagecache_with_config(env)
            .unwrap()
            .env("PATH", tools.path_env())
            .args(["render", "report.pdf", "-o", "out", "--program"])
            .arg(&tools.magick)
            .args(extra)
            .assert()
    }

    #[test]
    fn test_second_render_is_served_from_cache() {
        let env = TestEnvironment::new().unwrap();
        let tools = FakeTools::install(&env, 3).unwrap();

        render(&env, &tools, &[])
            .success()
            .stdout(predicate::str::contains("0 from cache, 3 rendered"));
        assert_eq!(tools.render_calls(), 3);

        render(&env, &tools, &[])
            .success()
            .stdout(predicate::str::contains("3 from cache, 0 rendered"));
        assert_eq!(tools.render_calls(), 3);

        for page in 1..=3 {
            let output = fs::read_to_string(env.output_dir.join(format!("report-{page}.png")))
                .unwrap();
            assert!(output.contains("-density 150"), "{output}");
            assert!(output.contains(&format!("report.pdf[{}]", page - 1)), "{output}");
        }
        assert_eq!(env.cache_children().unwrap().len(), 3);
    }

    #[test]
    fn test_page_selection_and_filters_reach_renderer() {
        let env = TestEnvironment::new().unwrap();
        let tools = FakeTools::install(&env, 5).unwrap();

        render(
            &env,
            &tools,
            &["--pages", "2,4-5", "--format", "jpeg", "--quality", "80", "--rotation", "90"],
        )
        .success();

        assert_eq!(tools.render_calls(), 3);
        let output = fs::read_to_string(env.output_dir.join("report-4.jpg")).unwrap();
        assert!(output.contains("report.pdf[3] -rotate 90 -quality 80"), "{output}");
        assert!(!env.output_dir.join("report-1.jpg").exists());
    }

    #[test]
    fn test_no_cache_always_renders() {
        let env = TestEnvironment::new().unwrap();
        let tools = FakeTools::install(&env, 2).unwrap();

        render(&env, &tools, &["--no-cache"])
            .success()
            .stdout(predicate::str::contains("cache disabled"));
        render(&env, &tools, &["--no-cache"]).success();

        assert_eq!(tools.render_calls(), 4);
        assert!(env.cache_children().unwrap().is_empty());
    }

    #[test]
    fn test_page_out_of_range_fails_before_rendering() {
        let env = TestEnvironment::new().unwrap();
        let tools = FakeTools::install(&env, 2).unwrap();

        render(&env, &tools, &["--pages", "3"])
            .failure()
            .stderr(predicate::str::contains("out of range"));
        assert_eq!(tools.render_calls(), 0);
    }
}

//! Common test utilities for pagecache integration tests

// Not every helper is used by every test module
#![allow(dead_code)]

use anyhow::{Context, Result};
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};

pub use pagecache::test_utils::TestEnvironment;

/// The `pagecache` binary, isolated from the user's config and log settings.
pub fn pagecache_cmd(env: &TestEnvironment) -> Command {
    let mut cmd = Command::cargo_bin("pagecache").expect("pagecache binary is built");
    cmd.current_dir(env.temp_dir.path())
        .env_remove("RUST_LOG")
        .env_remove("PAGECACHE_CONFIG")
        .env("PAGECACHE_NO_PROGRESS", "1")
        .env("NO_COLOR", "1")
        .env("XDG_CONFIG_HOME", env.temp_dir.path().join("xdg-config"))
        .env("XDG_CACHE_HOME", env.temp_dir.path().join("xdg-cache"));
    cmd
}

/// `pagecache_cmd` with `--config` pointing at a config whose cache lives in
/// the environment's cache directory.
pub fn pagecache_with_config(env: &TestEnvironment) -> Result<Command> {
    let config = env.write_config(serde_json::json!({}))?;
    let mut cmd = pagecache_cmd(env);
    cmd.arg("--config").arg(config);
    Ok(cmd)
}

/// Fake `pdfinfo` and `magick` executables for end-to-end renders.
///
/// The fake `magick` writes its arguments to the output path (its last
/// argument) and appends a line to `calls.log` per invocation.
#[cfg(unix)]
pub struct FakeTools {
    pub bin_dir: PathBuf,
    pub magick: PathBuf,
}

#[cfg(unix)]
impl FakeTools {
    pub fn install(env: &TestEnvironment, page_count: u32) -> Result<Self> {
        let bin_dir = env.temp_dir.path().join("bin");
        fs::create_dir_all(&bin_dir)?;

        let pdfinfo = bin_dir.join("pdfinfo");
        write_script(
            &pdfinfo,
            &format!("#!/bin/sh\necho \"Title:          fake\"\necho \"Pages:          {page_count}\"\n"),
        )?;

        let magick = bin_dir.join("magick");
        write_script(
            &magick,
            "#!/bin/sh\n\
             for last; do :; done\n\
             echo \"rendered $*\" > \"$last\"\n\
             echo call >> \"$(dirname \"$0\")/calls.log\"\n",
        )?;

        Ok(Self { bin_dir, magick })
    }

    /// `PATH` with the fake tools first.
    pub fn path_env(&self) -> String {
        let original = std::env::var("PATH").unwrap_or_default();
        format!("{}:{original}", self.bin_dir.display())
    }

    /// Number of times the fake `magick` ran.
    pub fn render_calls(&self) -> usize {
        fs::read_to_string(self.bin_dir.join("calls.log"))
            .map(|log| log.lines().count())
            .unwrap_or(0)
    }
}

#[cfg(unix)]
fn write_script(path: &Path, content: &str) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

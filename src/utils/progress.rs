//! Progress bar for multi-page renders.
//!
//! Wraps `indicatif` with pagecache styling. The bar is hidden when progress
//! output is disabled (`--no-progress`, `--quiet`) or the
//! `PAGECACHE_NO_PROGRESS` environment variable is set, so scripts get clean
//! output.

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};

/// Environment variable that disables progress output when set.
pub const NO_PROGRESS_ENV_VAR: &str = "PAGECACHE_NO_PROGRESS";

fn is_progress_disabled() -> bool {
    std::env::var_os(NO_PROGRESS_ENV_VAR).is_some()
}

/// A cloneable progress bar; clones update the same bar.
#[derive(Clone, Debug)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// A bar for `len` steps, or a hidden one when `enabled` is false.
    #[must_use]
    pub fn new(len: u64, enabled: bool) -> Self {
        let bar = if !enabled || is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new(len);
            bar.set_style(default_style());
            bar
        };
        Self { inner: bar }
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    pub fn inc(&self, delta: u64) {
        self.inner.inc(delta);
    }

    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

fn default_style() -> IndicatifStyle {
    IndicatifStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} pages {msg}")
        .unwrap_or_else(|_| IndicatifStyle::default_bar())
        .progress_chars("#>-")
}

//! Command-line interface for pagecache.
//!
//! # Commands
//!
//! - `render` - render document pages to image files, through the cache
//! - `key` - print the cache key of a page without rendering it
//! - `cache` - list, inspect, invalidate and clear cache entries
//! - `backends` - list registered cache backends
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - debug logging, including renderer command lines
//! - `--quiet` / `-q` - errors only, no progress or summaries
//! - `--config` / `-c` - path to a JSON config file
//! - `--no-progress` - hide progress bars
//!
//! `RUST_LOG` overrides the level chosen by `--verbose` / `--quiet`.
//!
//! # Examples
//!
//! ```bash
//! pagecache render report.pdf --pages 1,3-5 --format jpeg --quality 80 -o out/
//! pagecache key report.pdf --page 2 --brightness 110 --canonical
//! pagecache cache info
//! pagecache cache clear
//! ```

mod backends;
mod cache;
pub mod common;
mod key;
mod render;


use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::cache::CacheRegistry;
use crate::config::Config;

/// Settings derived from the global flags, shared by every command.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Filter directive for the crate's logs; `RUST_LOG` takes precedence
    pub log_level: String,
    /// Whether progress bars are suppressed
    pub no_progress: bool,
    /// Whether summaries and informational output are suppressed
    pub quiet: bool,
    /// Explicit config file
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Loads the config file this invocation points at.
    pub fn load_config(&self) -> Result<Config> {
        Config::load(self.config_path.as_deref())
    }

    /// The backend registry used by all commands.
    #[must_use]
    pub fn registry(&self) -> CacheRegistry {
        CacheRegistry::with_builtin_backends()
    }

    /// Whether progress bars should be drawn.
    #[must_use]
    pub const fn show_progress(&self) -> bool {
        !self.no_progress && !self.quiet
    }
}

/// Content-addressable cache for rendered document pages.
#[derive(Parser)]
#[command(
    name = "pagecache",
    about = "Render document pages to images through a content-addressable cache",
    version,
    long_about = "pagecache renders PDF pages with ImageMagick and stores each result under a \
                  SHA-256 key derived from the document, page and every rendering setting, so \
                  repeated renders are served from disk."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the JSON config file
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable progress bars
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render pages of a document, using the cache when possible
    Render(render::RenderCommand),

    /// Print the cache key of a page
    Key(key::KeyCommand),

    /// Manage cached pages
    Cache(cache::CacheCommand),

    /// List registered cache backends
    Backends(backends::BackendsCommand),
}

impl Cli {
    /// Sets up logging and runs the selected command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        init_logging(&config.log_level);
        self.execute_with_config(config).await
    }

    /// Derives the shared [`CliConfig`] from the global flags.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "pagecache=debug,render=debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        };

        CliConfig {
            log_level: log_level.to_string(),
            no_progress: self.no_progress,
            quiet: self.quiet,
            config_path: self.config.clone(),
        }
    }

    /// Runs the selected command with an explicit configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        match self.command {
            Commands::Render(cmd) => cmd.execute(&config).await,
            Commands::Key(cmd) => cmd.execute(&config),
            Commands::Cache(cmd) => cmd.execute(&config),
            Commands::Backends(cmd) => cmd.execute(&config),
        }
    }
}

/// Installs the global tracing subscriber, writing to stderr.
///
/// Only the first call in a process takes effect.
pub fn init_logging(default_level: &str) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(default_level)
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

//! Cache management commands.
//!
//! ```bash
//! pagecache cache list [--format json]
//! pagecache cache info
//! pagecache cache invalidate <key>...
//! pagecache cache clear
//! ```
//!
//! All subcommands operate on the cache named in the config file (or the
//! default filesystem cache) and fail when caching is disabled.

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::Path;

use crate::cli::CliConfig;
use crate::cli::common::{format_size, require_cache};
use crate::constants::FILESYSTEM_BACKEND;
use crate::utils::fs::dir_size;

/// Arguments of `pagecache cache`.
#[derive(Args, Debug)]
pub struct CacheCommand {
    #[command(subcommand)]
    command: CacheSubcommands,
}

#[derive(Subcommand, Debug)]
enum CacheSubcommands {
    /// List cached pages
    List {
        /// Output format: table or json
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show where the cache lives and how much it holds
    Info,

    /// Remove the entries for the given keys
    Invalidate {
        /// Keys as printed by `pagecache key` or `pagecache cache list`
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Remove every cached page
    Clear,
}

impl CacheCommand {
    pub fn execute(self, cli: &CliConfig) -> Result<()> {
        match self.command {
            CacheSubcommands::List { format } => list(cli, &format),
            CacheSubcommands::Info => info(cli),
            CacheSubcommands::Invalidate { keys } => invalidate(cli, &keys),
            CacheSubcommands::Clear => clear(cli),
        }
    }
}

fn list(cli: &CliConfig, format: &str) -> Result<()> {
    let (_, store) = require_cache(cli)?;
    let entries = store.entries().context("Failed to list cache entries")?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&entries)?),
        "table" => {
            if entries.is_empty() {
                if !cli.quiet {
                    println!("No cached pages in {}", store.location());
                }
                return Ok(());
            }
            println!("{:<64}  {:>10}  {}", "KEY".bold(), "SIZE".bold(), "FILE".bold());
            for entry in &entries {
                println!("{:<64}  {:>10}  {}", entry.key, format_size(entry.size), entry.filename);
            }
        }
        other => bail!("Unknown format '{other}' (expected 'table' or 'json')"),
    }
    Ok(())
}

fn info(cli: &CliConfig) -> Result<()> {
    let (backend, store) = require_cache(cli)?;
    let entries = store.entries().context("Failed to list cache entries")?;
    let payload: u64 = entries.iter().map(|e| e.size).sum();

    println!("{}", "Cache Information".bold());
    println!("  Backend:  {}", backend.cyan());
    println!("  Location: {}", store.location());
    println!("  Entries:  {}", entries.len());
    println!("  Payload:  {}", format_size(payload));

    if backend == FILESYSTEM_BACKEND {
        let on_disk = dir_size(Path::new(&store.location()))?;
        println!("  On disk:  {}", format_size(on_disk));
    }
    Ok(())
}

fn invalidate(cli: &CliConfig, keys: &[String]) -> Result<()> {
    let (_, store) = require_cache(cli)?;
    for key in keys {
        store
            .invalidate(key)
            .with_context(|| format!("Failed to invalidate {key}"))?;
        if !cli.quiet {
            println!("{} {key}", "Invalidated".green());
        }
    }
    Ok(())
}

fn clear(cli: &CliConfig) -> Result<()> {
    let (_, store) = require_cache(cli)?;
    let count = store.entries().map(|e| e.len()).unwrap_or(0);
    store.clear().context("Failed to clear cache")?;
    if !cli.quiet {
        println!(
            "{} {count} cached page(s) from {}",
            "Cleared".green(),
            store.location()
        );
    }
    Ok(())
}

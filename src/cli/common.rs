//! Pieces shared by several commands.

use anyhow::{Context, Result, bail};
use clap::Args;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::cache::{CacheRegistry, CacheStore};
use crate::cli::CliConfig;
use crate::config::Config;
use crate::renderer::{RendererSettings, RendererSettingsBuilder};

/// Rendering settings accepted by `render` and `key`.
///
/// Flags override the `renderer` section of the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Output format (png, jpeg, webp, tiff, gif, bmp)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Rasterization density in DPI
    #[arg(short, long)]
    pub resolution: Option<u32>,

    /// Output quality 1-100 (JPEG only)
    #[arg(long)]
    pub quality: Option<u8>,

    /// Brightness percent, 100 is unchanged
    #[arg(long, allow_negative_numbers = true)]
    pub brightness: Option<i32>,

    /// Contrast -100..100, 0 is unchanged
    #[arg(long, allow_negative_numbers = true)]
    pub contrast: Option<i32>,

    /// Saturation percent, 100 is unchanged
    #[arg(long, allow_negative_numbers = true)]
    pub saturation: Option<i32>,

    /// Clockwise rotation in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub rotation: Option<i32>,

    /// Background color to flatten transparency onto
    #[arg(long)]
    pub background: Option<String>,

    /// ImageMagick executable to run instead of `magick`/`convert`
    #[arg(long, value_name = "PATH")]
    pub program: Option<String>,
}

impl SettingsArgs {
    /// The flags as a settings layer.
    #[must_use]
    pub fn to_builder(&self) -> RendererSettingsBuilder {
        RendererSettingsBuilder {
            format: self.format.clone(),
            resolution: self.resolution,
            quality: self.quality,
            brightness: self.brightness,
            contrast: self.contrast,
            saturation: self.saturation,
            rotation: self.rotation,
            background: self.background.clone(),
            program: self.program.clone(),
        }
    }

    /// Config-file settings overlaid with these flags, validated.
    pub fn resolve(&self, config: &Config) -> Result<RendererSettings> {
        let settings = config
            .renderer
            .clone()
            .merge(self.to_builder())
            .build()
            .context("Invalid renderer settings")?;
        tracing::debug!("Renderer settings: {settings:?}");
        Ok(settings)
    }
}

/// Opens the configured cache, or `None` when caching is disabled.
pub fn open_cache(config: &Config, registry: &CacheRegistry) -> Result<Option<Arc<dyn CacheStore>>> {
    let Some(cache_config) = config.cache_config()? else {
        tracing::debug!("Caching disabled by configuration");
        return Ok(None);
    };
    let store = registry
        .create(&cache_config)
        .with_context(|| format!("Failed to open '{}' cache", cache_config.backend))?;
    Ok(Some(Arc::from(store)))
}

/// Opens the configured cache for commands that cannot work without one.
///
/// Returns the backend name alongside the store.
pub fn require_cache(cli: &CliConfig) -> Result<(String, Arc<dyn CacheStore>)> {
    let config = cli.load_config()?;
    let Some(cache_config) = config.cache_config()? else {
        bail!("Caching is disabled in the configuration (\"cache\": null)");
    };
    let store = cli
        .registry()
        .create(&cache_config)
        .with_context(|| format!("Failed to open '{}' cache", cache_config.backend))?;
    Ok((cache_config.backend, Arc::from(store)))
}

/// Parses a page selection such as `1,3-5` into page numbers.
///
/// Keeps the order given, drops duplicates and rejects page 0, reversed
/// ranges and pages past `page_count`. Ranges are bounds-checked before they
/// are expanded.
pub fn parse_pages(spec: &str, page_count: u32) -> Result<Vec<u32>> {
    let mut pages = Vec::new();
    let mut seen = BTreeSet::new();

    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (start, end) = match part.split_once('-') {
            Some((start, end)) => (parse_page(start)?, parse_page(end)?),
            None => {
                let page = parse_page(part)?;
                (page, page)
            }
        };
        if start > end {
            bail!("Invalid page range '{part}': start is after end");
        }
        if end > page_count {
            bail!("Page {end} is out of range ({page_count} pages)");
        }
        pages.extend((start..=end).filter(|page| seen.insert(*page)));
    }

    if pages.is_empty() {
        bail!("No pages selected by '{spec}'");
    }
    Ok(pages)
}

fn parse_page(s: &str) -> Result<u32> {
    let page: u32 = s
        .trim()
        .parse()
        .with_context(|| format!("Invalid page number '{}'", s.trim()))?;
    if page == 0 {
        bail!("Page numbers start at 1");
    }
    Ok(page)
}

/// Human-readable byte count.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.2} {}", UNITS[unit])
    }
}

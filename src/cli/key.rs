//! Print the cache key of a page.
//!
//! Useful for finding a page's entry in the cache directory or invalidating
//! it. Needs neither ImageMagick nor `pdfinfo`: the page number is not checked
//! against the document.
//!
//! ```bash
//! pagecache key report.pdf --page 2 --brightness 110 --canonical
//! ```

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::cache::RenderParameters;
use crate::cli::CliConfig;
use crate::cli::common::SettingsArgs;
use crate::constants::MAGICK_PROGRAM;
use crate::document::PageRef;
use crate::facade::RenderingFacade;
use crate::renderer::{ImageMagickRenderer, Renderer};

/// Arguments of `pagecache key`.
#[derive(Args, Debug)]
pub struct KeyCommand {
    /// Document the page belongs to
    document: PathBuf,

    /// 1-indexed page number
    #[arg(short, long)]
    page: u32,

    /// Also print the canonical parameter string the key is hashed from
    #[arg(long)]
    canonical: bool,

    #[command(flatten)]
    settings: SettingsArgs,
}

impl KeyCommand {
    pub fn execute(self, cli: &CliConfig) -> Result<()> {
        let config = cli.load_config()?;
        let settings = self.settings.resolve(&config)?;
        let program = settings.program().unwrap_or(MAGICK_PROGRAM).to_string();
        let renderer = ImageMagickRenderer::with_program(settings, program);

        let page = PageRef::resolve(&self.document, self.page)
            .with_context(|| format!("Failed to resolve {}", self.document.display()))?;

        if self.canonical {
            let extra = renderer.extra_parameters();
            let params = RenderParameters::new(
                page.document(),
                page.number(),
                renderer.settings().base(),
                &extra,
            );
            println!("{}", params.canonical_string());
        }
        println!("{}", RenderingFacade::cache_key(&page, &renderer));
        Ok(())
    }
}

//! Render document pages to image files.
//!
//! Pages are rendered concurrently, each on tokio's blocking pool, with at
//! most `--max-parallel` renders in flight. Every page goes through
//! [`RenderingFacade`], so pages rendered before with the same settings are
//! copied out of the cache instead of re-rendered.
//!
//! # Examples
//!
//! ```bash
//! # All pages as PNG into the current directory
//! pagecache render report.pdf
//!
//! # Pages 1 and 3 to 5 as JPEG
//! pagecache render report.pdf --pages 1,3-5 --format jpeg --quality 80 -o out/
//!
//! # Bypass the cache
//! pagecache render report.pdf --no-cache
//! ```
//!
//! # Cache write failures
//!
//! A page that rendered but could not be cached is still written to the
//! output directory. The command then exits with an error so scripts notice
//! that the cache is not working.

use anyhow::{Context, Result, anyhow};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::cli::CliConfig;
use crate::cli::common::{SettingsArgs, open_cache, parse_pages};
use crate::constants::default_max_parallel;
use crate::core::PageCacheError;
use crate::document::{Document, PageRef, PdfInfo};
use crate::facade::{PageSource, RenderedPage, RenderingFacade};
use crate::renderer::{ImageMagickRenderer, Renderer};
use crate::utils::fs::{atomic_write, ensure_dir};
use crate::utils::progress::ProgressBar;

/// Arguments of `pagecache render`.
#[derive(Args, Debug)]
pub struct RenderCommand {
    /// Document to render
    document: PathBuf,

    /// Pages to render, e.g. `1,3-5` (default: all)
    #[arg(short, long)]
    pages: Option<String>,

    /// Directory to write rendered pages into
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Render without reading or writing the cache
    #[arg(long)]
    no_cache: bool,

    /// Maximum number of concurrent renders
    #[arg(long, value_name = "N")]
    max_parallel: Option<usize>,

    #[command(flatten)]
    settings: SettingsArgs,
}

/// Per-run counters for the summary line.
#[derive(Debug, Default)]
struct RenderSummary {
    from_cache: usize,
    rendered: usize,
    uncached: usize,
    written: Vec<PathBuf>,
    errors: Vec<(u32, PageCacheError)>,
}

impl RenderCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let config = cli.load_config()?;
        let settings = self.settings.resolve(&config)?;
        let renderer: Arc<dyn Renderer> = Arc::new(ImageMagickRenderer::new(settings)?);

        let document = Document::open(&self.document, &PdfInfo::default())
            .with_context(|| format!("Failed to open {}", self.document.display()))?;
        let pages = self.select_pages(&document)?;

        let cache = if self.no_cache {
            None
        } else {
            open_cache(&config, &cli.registry())?
        };
        let facade = RenderingFacade::new(cache);

        let max_parallel = self
            .max_parallel
            .or(config.max_parallel)
            .unwrap_or_else(default_max_parallel)
            .clamp(1, pages.len().max(1));

        tracing::debug!(
            "Rendering {} page(s) of {} with up to {max_parallel} in parallel",
            pages.len(),
            document.path().display()
        );

        ensure_dir(&self.output_dir)?;
        let progress = ProgressBar::new(pages.len() as u64, cli.show_progress());
        progress.set_message(
            document
                .path()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );

        let total = pages.len();
        let results = render_all(&facade, &renderer, pages, max_parallel, &progress).await?;
        progress.finish_and_clear();

        let summary = self.write_outputs(results, renderer.as_ref())?;
        self.report(&summary, cli);

        let failed = summary.errors.len();
        match summary.errors.into_iter().next() {
            None => Ok(()),
            Some((page, first)) => Err(anyhow::Error::from(first).context(format!(
                "{failed} of {total} page(s) failed, first failure on page {page}"
            ))),
        }
    }

    fn select_pages(&self, document: &Document) -> Result<Vec<PageRef>> {
        match &self.pages {
            None => Ok(document.pages()),
            Some(spec) => parse_pages(spec, document.page_count())?
                .into_iter()
                .map(|page| document.page(page).map_err(anyhow::Error::from))
                .collect(),
        }
    }

    /// Writes every successfully produced page, including pages whose cache
    /// write failed, and tallies the outcome.
    fn write_outputs(
        &self,
        results: Vec<(PageRef, crate::core::Result<RenderedPage>)>,
        renderer: &dyn Renderer,
    ) -> Result<RenderSummary> {
        let extension = renderer.settings().base().format.extension();
        let mut summary = RenderSummary::default();

        for (page, result) in results {
            match result {
                Ok(rendered) => {
                    match rendered.source {
                        PageSource::Cache => summary.from_cache += 1,
                        PageSource::Rendered => summary.rendered += 1,
                        PageSource::Uncached => summary.uncached += 1,
                    }
                    summary
                        .written
                        .push(write_page(&self.output_dir, &rendered.filename, &rendered.data)?);
                }
                Err(error) => {
                    if let PageCacheError::CacheWriteFailed { rendered, .. } = &error {
                        let filename = page.file_name(extension);
                        summary
                            .written
                            .push(write_page(&self.output_dir, &filename, &rendered.0)?);
                        summary.rendered += 1;
                    }
                    summary.errors.push((page.number(), error));
                }
            }
        }

        Ok(summary)
    }

    fn report(&self, summary: &RenderSummary, cli: &CliConfig) {
        if cli.quiet {
            return;
        }

        for (page, error) in &summary.errors {
            eprintln!("{} page {page}: {error}", "warning".yellow().bold());
        }

        let total = summary.written.len();
        if total == 0 {
            return;
        }
        let detail = if self.no_cache || summary.uncached > 0 {
            "cache disabled".to_string()
        } else {
            format!(
                "{} from cache, {} rendered",
                summary.from_cache, summary.rendered
            )
        };
        println!(
            "{} {total} page(s) into {} ({detail})",
            "Rendered".green().bold(),
            self.output_dir.display()
        );
    }
}

/// Renders `pages` on the blocking pool, at most `max_parallel` at a time,
/// and returns the results in page order.
async fn render_all(
    facade: &RenderingFacade,
    renderer: &Arc<dyn Renderer>,
    pages: Vec<PageRef>,
    max_parallel: usize,
    progress: &ProgressBar,
) -> Result<Vec<(PageRef, crate::core::Result<RenderedPage>)>> {
    let semaphore = Arc::new(Semaphore::new(max_parallel));

    let tasks = pages.into_iter().map(|page| {
        let semaphore = Arc::clone(&semaphore);
        let facade = facade.clone();
        let renderer = Arc::clone(renderer);
        let progress = progress.clone();

        async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| anyhow!("Render queue closed: {e}"))?;

            let task_page = page.clone();
            let result = tokio::task::spawn_blocking(move || {
                facade.render_page(&task_page, renderer.as_ref())
            })
            .await
            .with_context(|| format!("Render task for page {} panicked", page.number()))?;

            progress.inc(1);
            Ok::<_, anyhow::Error>((page, result))
        }
    });

    futures::future::try_join_all(tasks).await
}

fn write_page(output_dir: &Path, filename: &str, data: &[u8]) -> Result<PathBuf> {
    let path = output_dir.join(filename);
    atomic_write(&path, data)?;
    tracing::debug!("Wrote {} ({} bytes)", path.display(), data.len());
    Ok(path)
}

//! Page renderers.
//!
//! A [`Renderer`] turns one page of a document into image bytes. It also
//! exposes the settings that influence those bytes, which is what the cache
//! key is derived from:
//!
//! - [`Renderer::settings`] gives the base settings (format, resolution,
//!   quality) used for the mandatory part of the canonical parameter string
//! - [`Renderer::extra_parameters`] lists every configured optional setting as
//!   `key=value`, in a stable order
//!
//! The only shipped implementation is [`ImageMagickRenderer`], which shells
//! out to ImageMagick with an argument list built by [`MagickCommand`].

pub mod command;
pub mod imagemagick;
pub mod settings;

pub use command::MagickCommand;
pub use imagemagick::ImageMagickRenderer;
pub use settings::{BaseSettings, Filters, ImageFormat, RendererSettings, RendererSettingsBuilder};

use std::path::Path;

use crate::core::{PageCacheError, Result};
use crate::document::PageRef;

/// Something that can rasterize a document page.
///
/// Implementations must be deterministic with respect to their settings: two
/// renderers reporting the same settings and extra parameters must produce
/// interchangeable images, because they share cache entries.
pub trait Renderer: Send + Sync {
    /// Settings feeding the mandatory part of the cache key.
    fn settings(&self) -> &RendererSettings;

    /// Optional or implementation-specific parameters as `key=value` strings.
    ///
    /// The order must be stable across calls with the same configuration.
    fn extra_parameters(&self) -> Vec<String> {
        self.settings().extra_parameters()
    }

    /// Render `page` (1-indexed) of `document` into a file at `output`.
    fn render_to(&self, document: &Path, page: u32, output: &Path) -> Result<()>;

    /// Render a page and return the image bytes.
    ///
    /// Renders into a private temporary directory and reads the result back.
    fn render(&self, page: &PageRef) -> Result<Vec<u8>> {
        let failure = |reason: String| PageCacheError::RenderFailed {
            document: page.document().to_path_buf(),
            page: page.number(),
            reason,
        };

        let scratch = tempfile::Builder::new()
            .prefix("pagecache-render-")
            .tempdir()
            .map_err(|e| failure(format!("failed to create scratch directory: {e}")))?;
        let output = scratch
            .path()
            .join(format!("page.{}", self.settings().base().format.extension()));

        self.render_to(page.document(), page.number(), &output)?;

        std::fs::read(&output)
            .map_err(|e| failure(format!("renderer produced no readable output: {e}")))
    }
}

//! ImageMagick-backed [`Renderer`].

use std::path::Path;

use crate::constants::{LEGACY_MAGICK_PROGRAM, MAGICK_PROGRAM};
use crate::core::{PageCacheError, Result};
use crate::renderer::{MagickCommand, Renderer, RendererSettings};
use crate::utils::platform::find_program;

/// Renders PDF pages by running ImageMagick (which delegates to Ghostscript).
#[derive(Debug, Clone)]
pub struct ImageMagickRenderer {
    settings: RendererSettings,
    program: String,
}

impl ImageMagickRenderer {
    /// Creates a renderer, locating the ImageMagick executable.
    ///
    /// Uses the `program` from `settings` when configured, otherwise the first
    /// of `magick` and `convert` found in `PATH`.
    ///
    /// # Errors
    ///
    /// [`PageCacheError::RendererNotFound`] when no executable is available.
    pub fn new(settings: RendererSettings) -> Result<Self> {
        let program = match settings.program() {
            Some(program) => program.to_string(),
            None => find_program(&[MAGICK_PROGRAM, LEGACY_MAGICK_PROGRAM]).ok_or_else(|| {
                PageCacheError::RendererNotFound {
                    program: MAGICK_PROGRAM.to_string(),
                }
            })?,
        };
        tracing::debug!(target: "render", "Using renderer program {program}");
        Ok(Self::with_program(settings, program))
    }

    /// Creates a renderer for an explicit executable without looking it up.
    pub fn with_program(settings: RendererSettings, program: impl Into<String>) -> Self {
        Self {
            settings,
            program: program.into(),
        }
    }

    /// The executable this renderer invokes.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The command that would render `page` of `document` into `output`.
    #[must_use]
    pub fn command(&self, document: &Path, page: u32, output: &Path) -> MagickCommand {
        MagickCommand::for_page(&self.program, &self.settings, document, page, output)
    }
}

impl Renderer for ImageMagickRenderer {
    fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    fn render_to(&self, document: &Path, page: u32, output: &Path) -> Result<()> {
        self.command(document, page, output).execute()?;

        if !output.is_file() {
            return Err(PageCacheError::RenderFailed {
                document: document.to_path_buf(),
                page,
                reason: format!(
                    "{} exited successfully but wrote nothing to {}",
                    self.program,
                    output.display()
                ),
            });
        }
        Ok(())
    }
}

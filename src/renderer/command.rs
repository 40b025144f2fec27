//! Deterministic ImageMagick command construction.
//!
//! ImageMagick applies options in the order they appear, so argument order is
//! part of correctness:
//!
//! 1. `-density` (must precede the input to affect rasterization)
//! 2. `<input>[<index>]` (page selection is part of the input spec, 0-based)
//! 3. `-background <color> -flatten`
//! 4. `-rotate`
//! 5. `-modulate <brightness>,<saturation>`
//! 6. `-brightness-contrast 0x<contrast>`
//! 7. `-quality` (JPEG only)
//! 8. `<output>`
//!
//! Filters at their neutral value are left out entirely.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::constants::NEUTRAL_MODULATE;
use crate::core::{PageCacheError, Result};
use crate::renderer::RendererSettings;

/// Builder for one ImageMagick invocation.
///
/// # Examples
///
/// ```rust
/// use pagecache::renderer::{MagickCommand, RendererSettingsBuilder};
/// use std::path::Path;
///
/// let settings = RendererSettingsBuilder {
///     rotation: Some(90),
///     ..Default::default()
/// }
/// .build()?;
///
/// let cmd = MagickCommand::for_page(
///     "magick",
///     &settings,
///     Path::new("/docs/a.pdf"),
///     2,
///     Path::new("/tmp/out.png"),
/// );
/// assert_eq!(
///     cmd.get_args(),
///     ["-density", "150", "/docs/a.pdf[1]", "-rotate", "90", "/tmp/out.png"]
/// );
/// # Ok::<(), pagecache::core::PageCacheError>(())
/// ```
#[derive(Debug, Clone)]
pub struct MagickCommand {
    /// Executable to run (`magick`, `convert` or a configured path)
    program: String,

    /// Arguments in invocation order
    args: Vec<String>,

    /// Document being rendered, for error messages
    document: PathBuf,

    /// 1-indexed page being rendered, for error messages
    page: u32,
}

impl MagickCommand {
    /// Creates an empty command for `program`.
    pub fn new(program: impl Into<String>, document: impl Into<PathBuf>, page: u32) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            document: document.into(),
            page,
        }
    }

    /// Builds the full command rendering `page` (1-indexed) of `input` into `output`.
    pub fn for_page(
        program: impl Into<String>,
        settings: &RendererSettings,
        input: &Path,
        page: u32,
        output: &Path,
    ) -> Self {
        let base = settings.base();
        let filters = settings.filters();

        let mut cmd = Self::new(program, input, page)
            .arg("-density")
            .arg(base.resolution.to_string())
            .arg(format!("{}[{}]", input.display(), page.saturating_sub(1)));

        if let Some(background) = &filters.background {
            cmd = cmd.args(["-background", background.as_str(), "-flatten"]);
        }

        if let Some(rotation) = settings.effective_rotation() {
            cmd = cmd.arg("-rotate").arg(rotation.to_string());
        }

        if settings.modulates() {
            let brightness = filters.brightness.unwrap_or(NEUTRAL_MODULATE);
            let saturation = filters.saturation.unwrap_or(NEUTRAL_MODULATE);
            cmd = cmd.arg("-modulate").arg(format!("{brightness},{saturation}"));
        }

        if let Some(contrast) = settings.effective_contrast() {
            cmd = cmd.arg("-brightness-contrast").arg(format!("0x{contrast}"));
        }

        if base.format.uses_quality() {
            cmd = cmd.arg("-quality").arg(base.quality.to_string());
        }

        cmd.arg(output.display().to_string())
    }

    /// Appends a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments in order.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The executable this command runs.
    #[must_use]
    pub fn get_program(&self) -> &str {
        &self.program
    }

    /// The arguments in invocation order.
    #[must_use]
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Runs the command to completion, blocking the calling thread.
    ///
    /// A missing executable maps to [`PageCacheError::RendererNotFound`]; a
    /// non-zero exit maps to [`PageCacheError::RenderFailed`] with stderr.
    pub fn execute(&self) -> Result<()> {
        tracing::debug!(
            target: "render",
            "Executing command: {} {}",
            self.program,
            self.args.join(" ")
        );

        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PageCacheError::RendererNotFound {
                        program: self.program.clone(),
                    }
                } else {
                    self.failure(format!("failed to start {}: {e}", self.program))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::debug!(
                target: "render",
                "Command failed with exit code: {:?}",
                output.status.code()
            );
            return Err(self.failure(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }

    fn failure(&self, reason: String) -> PageCacheError {
        PageCacheError::RenderFailed {
            document: self.document.clone(),
            page: self.page,
            reason,
        }
    }
}

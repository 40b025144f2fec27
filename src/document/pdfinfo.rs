//! Page counting with poppler's `pdfinfo`.

use regex::Regex;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::LazyLock;

use crate::constants::PDFINFO_PROGRAM;
use crate::core::{PageCacheError, Result};
use crate::document::PageCountProvider;
use crate::utils::platform::command_exists;

static PAGES_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Pages:\s+(\d+)\s*$").expect("valid regex"));

/// [`PageCountProvider`] that runs `pdfinfo <document>`.
#[derive(Debug, Clone)]
pub struct PdfInfo {
    program: String,
}

impl Default for PdfInfo {
    fn default() -> Self {
        Self::new(PDFINFO_PROGRAM)
    }
}

impl PdfInfo {
    /// Uses `program` instead of looking up `pdfinfo` in `PATH`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl PageCountProvider for PdfInfo {
    fn page_count(&self, path: &Path) -> Result<u32> {
        if !command_exists(&self.program) {
            return Err(PageCacheError::RendererNotFound {
                program: self.program.clone(),
            });
        }

        tracing::debug!(target: "render", "Executing command: {} {}", self.program, path.display());

        let output = Command::new(&self.program)
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PageCacheError::RendererNotFound {
                        program: self.program.clone(),
                    }
                } else {
                    PageCacheError::DocumentInspectFailed {
                        document: path.to_path_buf(),
                        reason: format!("failed to start {}: {e}", self.program),
                    }
                }
            })?;

        if !output.status.success() {
            return Err(PageCacheError::DocumentInspectFailed {
                document: path.to_path_buf(),
                reason: format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        parse_page_count(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            PageCacheError::DocumentInspectFailed {
                document: path.to_path_buf(),
                reason: "no 'Pages:' line in pdfinfo output".to_string(),
            }
        })
    }
}

/// Extracts the page count from `pdfinfo` output.
fn parse_page_count(output: &str) -> Option<u32> {
    PAGES_LINE
        .captures(output)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

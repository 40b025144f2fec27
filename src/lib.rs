//! pagecache - content-addressable cache for rendered document pages
//!
//! Rendering a PDF page to an image is slow. pagecache stores every rendered
//! page under a key derived from everything that influences its bytes (the
//! document path, the page number, the output format, resolution, quality
//! and every configured filter), so repeating a render with the same inputs
//! is a file read.
//!
//! # Architecture Overview
//!
//! ```text
//! PageRef + Renderer ──> RenderingFacade ──> key ──> CacheStore::get
//!                              │                          │ miss
//!                              └──── Renderer::render <───┘
//!                                          │
//!                                          └──> CacheStore::set
//! ```
//!
//! - A canonical parameter string is built from the request and hashed with
//!   SHA-256 into a 64-character hex key ([`cache::key`])
//! - A [`cache::CacheStore`] keeps one entry per key; the shipped backend,
//!   [`cache::FilesystemCacheStore`], uses one directory per key
//! - Backends are created by name through a [`cache::CacheRegistry`]
//! - [`facade::RenderingFacade`] returns cached bytes on a hit and renders and
//!   stores on a miss
//!
//! # Core Modules
//!
//! - [`cache`] - key derivation, the storage contract, the filesystem backend
//!   and the backend registry
//! - [`facade`] - cache-or-render orchestration
//! - [`renderer`] - renderer settings and the ImageMagick renderer
//! - [`document`] - documents, page references and page counting
//! - [`core`] - error types and user-facing error reporting
//!
//! ## Supporting Modules
//!
//! - [`cli`] - the `pagecache` command-line interface
//! - [`config`] - JSON configuration file
//! - [`constants`] - defaults and limits
//! - [`utils`] - file system, platform and progress helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use pagecache::cache::{CacheConfig, CacheRegistry};
//! use pagecache::document::{Document, PdfInfo};
//! use pagecache::facade::RenderingFacade;
//! use pagecache::renderer::{ImageMagickRenderer, RendererSettingsBuilder};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # fn example() -> anyhow::Result<()> {
//! let registry = CacheRegistry::with_builtin_backends();
//! let store = registry.create(&CacheConfig::filesystem("~/.cache/pagecache"))?;
//! let facade = RenderingFacade::new(Some(Arc::from(store)));
//!
//! let settings = RendererSettingsBuilder {
//!     format: Some("jpeg".to_string()),
//!     quality: Some(80),
//!     ..Default::default()
//! }
//! .build()?;
//! let renderer = ImageMagickRenderer::new(settings)?;
//!
//! let document = Document::open(Path::new("report.pdf"), &PdfInfo::default())?;
//! let bytes = facade.render(&document.page(1)?, &renderer)?;
//! # Ok(())
//! # }
//! ```

// Core functionality
pub mod cache;
pub mod core;
pub mod document;
pub mod facade;
pub mod renderer;

// Supporting modules
pub mod cli;
pub mod config;
pub mod constants;
pub mod utils;

// Test utilities (available for both unit tests and integration tests)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

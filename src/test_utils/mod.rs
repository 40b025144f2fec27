//! Test utilities for pagecache
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration suite.
//!
//! - [`init_test_logging`]: tracing output inside tests
//! - [`fakes`]: a counting renderer that needs no external tools, a cache
//!   store whose writes always fail and a fixed page-count provider
//! - [`environment`]: a temporary workspace with a cache directory, a sample
//!   document and a config file
//!
//! # Example
//!
//! ```rust,no_run
//! use pagecache::document::PageRef;
//! use pagecache::facade::RenderingFacade;
//! use pagecache::test_utils::{CountingRenderer, TestEnvironment};
//!
//! let env = TestEnvironment::new().unwrap();
//! let facade = RenderingFacade::new(Some(env.store()));
//! let renderer = CountingRenderer::default();
//!
//! let page = PageRef::new(env.document(), 1);
//! facade.render(&page, &renderer).unwrap();
//! facade.render(&page, &renderer).unwrap();
//! assert_eq!(renderer.calls(), 1);
//! ```

pub mod environment;
pub mod fakes;

pub use environment::TestEnvironment;
pub use fakes::{CountingRenderer, FailingStore, FixedPageCount, fake_page_bytes};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, tests run without a subscriber.
///
/// ```bash
/// RUST_LOG=pagecache=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true) // Show targets like "render"
            .with_thread_ids(false)
            .try_init();
    });
}

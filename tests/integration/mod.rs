//! Integration test suite for pagecache
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **cache_store**: filesystem store behavior under concurrency and clearing
//! - **facade**: cache-or-render scenarios with a counting renderer
//! - **registry**: creating stores from JSON configuration
//! - **cli**: the `pagecache` binary

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod cache_store;
mod cli;
mod facade;
mod registry;

//! Named cache backends.
//!
//! The registry maps a backend name from configuration (`"type": "filesystem"`)
//! to a factory building a [`CacheStore`] from the backend's options. Built-in
//! backends are registered explicitly by whoever assembles the application,
//! usually through [`CacheRegistry::with_builtin_backends`].

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::cache::{CacheConfig, CacheOptions, CacheStore, FilesystemCacheStore};
use crate::constants::FILESYSTEM_BACKEND;
use crate::core::{PageCacheError, Result};

/// Builds a store from backend options.
pub type CacheFactory = Arc<dyn Fn(&CacheOptions) -> Result<Box<dyn CacheStore>> + Send + Sync>;

/// Thread-safe map from backend name to [`CacheFactory`].
///
/// Lookups take a shared lock, registrations an exclusive one, so a
/// long-running process may register backends while others are being created.
#[derive(Default)]
pub struct CacheRegistry {
    factories: RwLock<BTreeMap<String, CacheFactory>>,
}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("backends", &self.list_caches())
            .finish()
    }
}

impl CacheRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every backend shipped in this crate.
    #[must_use]
    pub fn with_builtin_backends() -> Self {
        let registry = Self::new();
        registry.register(FILESYSTEM_BACKEND, |options: &CacheOptions| {
            Ok(Box::new(FilesystemCacheStore::from_options(options)?) as Box<dyn CacheStore>)
        });
        registry
    }

    /// Registers `factory` under `name`, replacing any previous registration.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty or only whitespace.
    pub fn register<F>(&self, name: &str, factory: F)
    where
        F: Fn(&CacheOptions) -> Result<Box<dyn CacheStore>> + Send + Sync + 'static,
    {
        assert!(
            !name.trim().is_empty(),
            "cache backend name must not be empty"
        );

        let mut factories = self
            .factories
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if factories.insert(name.to_string(), Arc::new(factory)).is_some() {
            tracing::debug!("Replaced cache backend '{name}'");
        } else {
            tracing::debug!("Registered cache backend '{name}'");
        }
    }

    /// Creates the store named by `config.backend` with `config.options`.
    ///
    /// # Errors
    ///
    /// [`PageCacheError::UnknownBackend`] when nothing is registered under the
    /// name; otherwise whatever the factory returns, unchanged.
    pub fn create(&self, config: &CacheConfig) -> Result<Box<dyn CacheStore>> {
        // Clone the factory out so it runs without holding the lock
        let factory = {
            let factories = self
                .factories
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            factories.get(&config.backend).cloned()
        };

        let factory = factory.ok_or_else(|| PageCacheError::UnknownBackend {
            requested: config.backend.clone(),
            available: self.list_caches(),
        })?;

        let store = factory(&config.options)?;
        tracing::debug!(
            "Created '{}' cache at {}",
            config.backend,
            store.location()
        );
        Ok(store)
    }

    /// Registered backend names in sorted order.
    #[must_use]
    pub fn list_caches(&self) -> Vec<String> {
        self.factories
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

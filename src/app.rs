//! Application context
//!
//! Owns the long-lived pieces of state that the rest of the application
//! borrows: configuration and the metadata caches. Built once at startup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::{Clock, MetadataCaches, SystemClock};
use crate::config::{Config, ConfigError};
use crate::provider::{LoaderHandle, ProviderError, Resolver};

/// Shared application state
pub struct AppContext {
    config: Config,
    cache_dir: PathBuf,
    caches: MetadataCaches,
}

impl AppContext {
    /// Creates the context for `config`
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates the context with caches reading time from `clock`
    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        let cache_dir = config.cache_dir()?;
        let caches = MetadataCaches::with_clock(&cache_dir, clock);
        Ok(Self {
            config,
            cache_dir,
            caches,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Directory holding every cache file
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// The metadata caches
    pub fn caches(&self) -> &MetadataCaches {
        &self.caches
    }

    /// Loads every provider under `dir`, or under the configured providers
    /// directory when `dir` is `None`
    ///
    /// Any error aborts loading; no partial set is returned.
    pub fn load_providers(&self, dir: Option<&Path>) -> Result<Vec<LoaderHandle>, ProviderError> {
        let resolver = Resolver::from_config(&self.config)?;
        let dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None => self.config.providers_dir()?,
        };
        resolver.loaders(&dir)
    }
}

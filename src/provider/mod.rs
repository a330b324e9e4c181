//! Content-source providers
//!
//! Providers live in directories marked by a `provider.toml` descriptor.
//! The `Resolver` finds them, and every single provider gets a
//! `LoaderHandle` with its own SQLite HTTP response cache.

mod descriptor;
mod http;
mod http_cache;
mod loader;
mod resolver;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

pub use descriptor::{Descriptor, ProviderInfo, ProviderKind, DESCRIPTOR_FILE, ENTRY_SCRIPT};
pub use http::{fingerprint, CachingClient, HttpError, REQUEST_TIMEOUT};
pub use http_cache::{
    CachedResponse, Codec, HttpCacheError, HttpCacheOptions, HttpCacheStore, JsonCodec,
};
pub use loader::{
    http_store_path, new_loader, LoaderHandle, LoaderOptions, ScriptEngine, ScriptSource,
    HTTP_CACHE_DIR,
};
pub use resolver::Resolver;

/// Errors raised while discovering or loading providers
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A directory, descriptor, or script could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A single provider has no entry script
    #[error("{path} is missing")]
    MissingScript { path: PathBuf },

    /// The descriptor declares a type that is neither single nor bundle
    #[error("Unknown provider type {kind:?} in {path}")]
    UnknownType { kind: String, path: PathBuf },

    /// The descriptor is not valid TOML or lacks required fields
    #[error("Invalid provider descriptor {path}: {source}")]
    Descriptor {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The provider's HTTP cache could not be opened
    #[error("Failed to open HTTP cache for provider {name}: {source}")]
    HttpCache {
        name: String,
        #[source]
        source: HttpCacheError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Http(#[from] HttpError),

    /// The script engine could not instantiate the provider
    #[error("Provider {name} failed to load: {source}")]
    Engine {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

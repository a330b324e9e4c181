//! Loader handles for single providers
//!
//! A `LoaderHandle` is everything needed to bring up one provider: its
//! metadata, the entry script, and its own HTTP response cache. Turning the
//! script into a running provider is the job of a `ScriptEngine`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::descriptor::{ProviderInfo, ENTRY_SCRIPT};
use super::http::CachingClient;
use super::http_cache::{HttpCacheOptions, HttpCacheStore};
use super::ProviderError;

/// Subdirectory of the cache directory holding provider HTTP caches
pub const HTTP_CACHE_DIR: &str = "providers";

/// Settings shared by every loader built during one resolution
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Root cache directory
    pub cache_dir: PathBuf,
    /// Lifetime of cached HTTP responses
    pub http_ttl: Duration,
}

/// What a script engine receives to instantiate a provider
pub struct ScriptSource<'a> {
    pub info: &'a ProviderInfo,
    /// Contents of the entry script
    pub script: &'a str,
    /// Directories the script may load modules from
    pub package_paths: &'a [PathBuf],
    /// HTTP client wired to the provider's cache
    pub http: CachingClient,
}

/// Runs provider scripts
///
/// Implemented outside this crate by whatever embeds the scripting runtime.
pub trait ScriptEngine {
    type Provider;
    type Error: std::error::Error + Send + Sync + 'static;

    fn instantiate(&self, source: ScriptSource<'_>) -> Result<Self::Provider, Self::Error>;
}

/// A discovered provider, ready to be instantiated
pub struct LoaderHandle {
    info: ProviderInfo,
    dir: PathBuf,
    script: String,
    package_paths: Vec<PathBuf>,
    http_store: Arc<HttpCacheStore>,
}

impl LoaderHandle {
    pub fn info(&self) -> &ProviderInfo {
        &self.info
    }

    /// Directory the provider was loaded from
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Contents of the entry script
    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn package_paths(&self) -> &[PathBuf] {
        &self.package_paths
    }

    /// The provider's HTTP response cache
    pub fn http_store(&self) -> &Arc<HttpCacheStore> {
        &self.http_store
    }

    /// Instantiates the provider with `engine`
    pub fn load<E: ScriptEngine>(&self, engine: &E) -> Result<E::Provider, ProviderError> {
        let http = CachingClient::new(Arc::clone(&self.http_store))?;
        let source = ScriptSource {
            info: &self.info,
            script: &self.script,
            package_paths: &self.package_paths,
            http,
        };

        engine
            .instantiate(source)
            .map_err(|e| ProviderError::Engine {
                name: self.info.name.clone(),
                source: Box::new(e),
            })
    }
}

impl std::fmt::Debug for LoaderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderHandle")
            .field("info", &self.info)
            .field("dir", &self.dir)
            .field("http_store", &self.http_store.path())
            .finish()
    }
}

/// Replaces characters that are unsafe in file names
fn sanitize_file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = stem.trim_matches('.');
    if stem.is_empty() {
        "provider".to_string()
    } else {
        stem.to_string()
    }
}

/// Path of the HTTP cache database for the provider `name` found in `dir`
///
/// The file name combines the declared name with a hash of the provider's
/// canonical directory, so two providers declaring the same name never
/// share a store.
pub fn http_store_path(cache_dir: &Path, name: &str, dir: &Path) -> PathBuf {
    let canonical = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
    let hex = blake3::hash(canonical.to_string_lossy().as_bytes()).to_hex();
    let short = &hex[..12];

    cache_dir
        .join(HTTP_CACHE_DIR)
        .join(format!("{}-{}.db", sanitize_file_stem(name), short))
}

/// Builds the loader for the single provider in `dir`
///
/// # Returns
/// * `Err(ProviderError::MissingScript)` naming the expected path if the entry script is absent
/// * `Err` if the script cannot be read or the HTTP cache cannot be opened
pub fn new_loader(
    info: ProviderInfo,
    dir: &Path,
    options: &LoaderOptions,
) -> Result<LoaderHandle, ProviderError> {
    let script_path = dir.join(ENTRY_SCRIPT);
    if !script_path.is_file() {
        return Err(ProviderError::MissingScript { path: script_path });
    }

    let script = fs::read_to_string(&script_path).map_err(|source| ProviderError::Io {
        path: script_path.clone(),
        source,
    })?;

    let store_path = http_store_path(&options.cache_dir, &info.name, dir);
    let store = HttpCacheStore::open(HttpCacheOptions {
        ttl: options.http_ttl,
        bucket: info.name.clone(),
        path: store_path,
    })
    .map_err(|source| ProviderError::HttpCache {
        name: info.name.clone(),
        source,
    })?;

    info!(provider = %info.name, dir = %dir.display(), "loaded provider");

    Ok(LoaderHandle {
        info,
        dir: dir.to_path_buf(),
        script,
        package_paths: vec![dir.to_path_buf()],
        http_store: Arc::new(store),
    })
}

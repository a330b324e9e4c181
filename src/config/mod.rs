//! Application configuration
//!
//! Read from `config.toml` in the config directory. Every field has a
//! default, so a missing file or a partial file is fine:
//!
//! ```toml
//! [paths]
//! cache_dir = "/var/cache/shelf"
//! providers_dir = "/opt/shelf/providers"
//!
//! [providers.cache]
//! ttl = "24h"
//! ```

mod duration;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::paths;

pub use duration::{parse_duration, DurationError};

/// Default lifetime of cached provider HTTP responses
pub const DEFAULT_PROVIDER_CACHE_TTL: &str = "24h";

/// Errors raised while loading or interpreting configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The config file is not valid TOML for this schema
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The provider cache TTL is not a valid duration
    #[error("Invalid provider cache TTL {value:?}: {source}")]
    InvalidTtl {
        value: String,
        #[source]
        source: DurationError,
    },

    /// A default location was needed but no home directory exists
    #[error("Cannot determine the {0} directory; set it in the config file")]
    NoDefaultDir(&'static str),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub providers: ProvidersConfig,
}

/// Overrides for default locations
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub cache_dir: Option<PathBuf>,
    pub providers_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub cache: ProviderCacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderCacheConfig {
    /// How long each cached HTTP response lives, e.g. `"24h"`
    pub ttl: String,
}

impl Default for ProviderCacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_PROVIDER_CACHE_TTL.to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`
    ///
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the configuration file from the default location
    pub fn load_default() -> Result<Self, ConfigError> {
        match paths::config_file() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Directory holding cache files
    pub fn cache_dir(&self) -> Result<PathBuf, ConfigError> {
        self.paths
            .cache_dir
            .clone()
            .or_else(paths::cache_dir)
            .ok_or(ConfigError::NoDefaultDir("cache"))
    }

    /// Directory scanned for providers
    pub fn providers_dir(&self) -> Result<PathBuf, ConfigError> {
        self.paths
            .providers_dir
            .clone()
            .or_else(paths::providers_dir)
            .ok_or(ConfigError::NoDefaultDir("providers"))
    }

    /// Parses the provider HTTP cache TTL
    pub fn provider_cache_ttl(&self) -> Result<Duration, ConfigError> {
        let value = &self.providers.cache.ttl;
        parse_duration(value).map_err(|source| ConfigError::InvalidTtl {
            value: value.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let config = Config::load(&temp_dir.path().join("config.toml")).expect("Load should succeed");

        assert_eq!(config.providers.cache.ttl, DEFAULT_PROVIDER_CACHE_TTL);
        assert!(config.paths.cache_dir.is_none());
        assert_eq!(
            config.provider_cache_ttl().expect("Default TTL should parse"),
            Duration::from_secs(24 * 3600)
        );
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[paths]\ncache_dir = \"/tmp/shelf-cache\"\n").expect("Should write config");

        let config = Config::load(&path).expect("Load should succeed");

        assert_eq!(
            config.cache_dir().expect("Cache dir should resolve"),
            PathBuf::from("/tmp/shelf-cache")
        );
        assert_eq!(config.providers.cache.ttl, DEFAULT_PROVIDER_CACHE_TTL);
    }

    #[test]
    fn test_provider_cache_ttl_from_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[providers.cache]\nttl = \"1h30m\"\n").expect("Should write config");

        let config = Config::load(&path).expect("Load should succeed");

        assert_eq!(
            config.provider_cache_ttl().expect("TTL should parse"),
            Duration::from_secs(5400)
        );
    }

    #[test]
    fn test_invalid_ttl_is_reported() {
        let mut config = Config::default();
        config.providers.cache.ttl = "soon".to_string();

        let err = config.provider_cache_ttl().expect_err("TTL should be rejected");

        assert!(matches!(err, ConfigError::InvalidTtl { .. }));
        assert!(err.to_string().contains("soon"));
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[providers.cache\n").expect("Should write config");

        let err = Config::load(&path).expect_err("Load should fail");

        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}

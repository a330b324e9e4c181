//! Command-line interface parsing for Shelf
//!
//! This module handles parsing of CLI arguments using clap, including
//! validation of the cache names accepted by `shelf cache clear`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::cache::CacheKind;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified cache name is not recognized
    #[error("Invalid cache: '{0}'. Valid caches: relation, search, id, fail, all")]
    InvalidCache(String),
}

/// Shelf - metadata caches and content-source providers
#[derive(Parser, Debug)]
#[command(name = "shelf")]
#[command(about = "Inspect metadata caches and load content-source providers")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file (defaults to the XDG config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Discover providers and list the ones that load
    Providers {
        /// Directory to scan instead of the configured providers directory
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },
    /// Inspect or clear the metadata caches
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Print the directories and files in use
    Where,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show location, expiration policy and entry count of each cache
    Info,
    /// Show the cached record bound to a title
    Lookup {
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Delete cache files
    ///
    /// Valid caches: relation, search, id, fail, all
    Clear {
        #[arg(value_name = "CACHE", default_value = "all")]
        cache: String,
    },
}

/// Which caches a command applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTarget {
    One(CacheKind),
    All,
}

impl CacheTarget {
    /// The caches this target covers
    pub fn kinds(&self) -> Vec<CacheKind> {
        match self {
            CacheTarget::One(kind) => vec![*kind],
            CacheTarget::All => CacheKind::ALL.to_vec(),
        }
    }
}

/// Parses a cache name argument into a CacheTarget.
///
/// # Arguments
/// * `s` - The cache name from CLI
///
/// # Returns
/// * `Ok(CacheTarget)` if the name matches a cache or `all`
/// * `Err(CliError::InvalidCache)` if the name doesn't match
pub fn parse_cache_arg(s: &str) -> Result<CacheTarget, CliError> {
    let name = s.trim().to_lowercase();
    if name == "all" {
        return Ok(CacheTarget::All);
    }
    CacheKind::ALL
        .iter()
        .find(|kind| kind.as_str() == name)
        .map(|kind| CacheTarget::One(*kind))
        .ok_or_else(|| CliError::InvalidCache(s.to_string()))
}

//! Provider descriptor files
//!
//! Every provider directory carries a `provider.toml` at its root. It names
//! the provider and says whether the directory is a single provider or a
//! bundle of further provider directories:
//!
//! ```toml
//! name = "mangadex"
//! type = "single"
//! version = "0.3.1"
//! description = "MangaDex source"
//! website = "https://mangadex.org"
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ProviderError;

/// Fixed name of the descriptor file
pub const DESCRIPTOR_FILE: &str = "provider.toml";

/// Fixed name of the entry script of a single provider
pub const ENTRY_SCRIPT: &str = "main.lua";

/// What a provider directory contains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// One provider with an entry script
    Single,
    /// A directory of provider directories
    Bundle,
}

impl ProviderKind {
    /// Parses the `type` field. `lua` is the older spelling of `single`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "single" | "lua" => Some(ProviderKind::Single),
            "bundle" => Some(ProviderKind::Bundle),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Single => f.write_str("single"),
            ProviderKind::Bundle => f.write_str("bundle"),
        }
    }
}

/// Identity and metadata of a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Stable identifier; defaults to the name
    pub id: String,
    /// Declared name
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDescriptor {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    id: Option<String>,
    version: Option<String>,
    description: Option<String>,
    website: Option<String>,
}

/// A parsed descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub kind: ProviderKind,
    pub info: ProviderInfo,
}

impl Descriptor {
    /// Whether `dir` has a descriptor file, i.e. is a provider root
    pub fn exists_in(dir: &Path) -> bool {
        dir.join(DESCRIPTOR_FILE).is_file()
    }

    /// Reads and parses the descriptor inside `dir`
    pub fn read(dir: &Path) -> Result<Self, ProviderError> {
        let path = dir.join(DESCRIPTOR_FILE);
        let contents = fs::read_to_string(&path).map_err(|source| ProviderError::Io {
            path: path.clone(),
            source,
        })?;
        Self::parse(&contents, &path)
    }

    /// Parses descriptor `contents`; `path` is only used in errors
    pub fn parse(contents: &str, path: &Path) -> Result<Self, ProviderError> {
        let raw: RawDescriptor =
            toml::from_str(contents).map_err(|source| ProviderError::Descriptor {
                path: path.to_path_buf(),
                source,
            })?;

        let kind = ProviderKind::from_name(&raw.kind).ok_or_else(|| ProviderError::UnknownType {
            kind: raw.kind.clone(),
            path: path.to_path_buf(),
        })?;

        Ok(Self {
            kind,
            info: ProviderInfo {
                id: raw.id.unwrap_or_else(|| raw.name.clone()),
                name: raw.name,
                version: raw.version,
                description: raw.description,
                website: raw.website,
            },
        })
    }
}

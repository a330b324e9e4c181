//! The metadata caches used to avoid repeated lookups
//!
//! | Cache    | Key             | Value            | TTL    |
//! |----------|-----------------|------------------|--------|
//! | relation | normalized name | id               | never  |
//! | search   | normalized name | list of ids      | 10 days|
//! | by-id    | id              | metadata record  | 2 days |
//! | failure  | normalized name | failed flag      | 1 min  |

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Duration;

use super::cacher::Cacher;
use super::clock::{Clock, SystemClock};
use super::expiring::{Cache, Ttl};
use super::store::CacheError;
use crate::data::{MetadataId, MetadataRecord};

/// File name of the relation cache
pub const RELATION_CACHE_FILE: &str = "metadata_relation_cache.json";
/// File name of the search cache
pub const SEARCH_CACHE_FILE: &str = "metadata_search_cache.json";
/// File name of the by-id cache
pub const ID_CACHE_FILE: &str = "metadata_id_cache.json";
/// File name of the failure cache
pub const FAIL_CACHE_FILE: &str = "metadata_fail_cache.json";

/// Search results change only as new titles appear
pub fn search_ttl() -> Ttl {
    Ttl::After(Duration::days(10))
}

/// Records are edited often enough to refresh every couple of days
pub fn id_ttl() -> Ttl {
    Ttl::After(Duration::days(2))
}

/// Failures are retried soon
pub fn fail_ttl() -> Ttl {
    Ttl::After(Duration::minutes(1))
}

/// Case-folds a name and collapses runs of whitespace
///
/// `"  One   PIECE "` and `"one piece"` normalize to the same key.
pub fn normalized_name(name: String) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Identifies one of the metadata caches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Relation,
    Search,
    Id,
    Fail,
}

impl CacheKind {
    /// Every cache, in display order
    pub const ALL: [CacheKind; 4] = [
        CacheKind::Relation,
        CacheKind::Search,
        CacheKind::Id,
        CacheKind::Fail,
    ];

    /// Short name used on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKind::Relation => "relation",
            CacheKind::Search => "search",
            CacheKind::Id => "id",
            CacheKind::Fail => "fail",
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one cache for reporting
#[derive(Debug, Clone)]
pub struct CacheSummary {
    pub kind: CacheKind,
    pub path: PathBuf,
    pub ttl: Ttl,
    /// Entries visible right now (expired blobs count as empty)
    pub entries: usize,
}

/// The four metadata caches, each with its own file and expiration policy
pub struct MetadataCaches {
    /// Name to id bindings
    pub relation: Cacher<String, MetadataId>,
    /// Search query to matching ids
    pub search: Cacher<String, Vec<MetadataId>>,
    /// Id to full record
    pub by_id: Cacher<MetadataId, MetadataRecord>,
    /// Names whose lookup recently failed
    pub failure: Cacher<String, bool>,
}

impl MetadataCaches {
    /// Opens the caches under `dir` using wall-clock time
    pub fn new(dir: &Path) -> Self {
        Self::with_clock(dir, Arc::new(SystemClock))
    }

    /// Opens the caches under `dir`, reading time from `clock`
    pub fn with_clock(dir: &Path, clock: Arc<dyn Clock>) -> Self {
        Self {
            relation: Cacher::new(
                Cache::with_clock(dir.join(RELATION_CACHE_FILE), Ttl::Never, clock.clone()),
                normalized_name,
            ),
            search: Cacher::new(
                Cache::with_clock(dir.join(SEARCH_CACHE_FILE), search_ttl(), clock.clone()),
                normalized_name,
            ),
            by_id: Cacher::new(
                Cache::with_clock(dir.join(ID_CACHE_FILE), id_ttl(), clock.clone()),
                |id| id,
            ),
            failure: Cacher::new(
                Cache::with_clock(dir.join(FAIL_CACHE_FILE), fail_ttl(), clock),
                normalized_name,
            ),
        }
    }

    /// Stores `record` by id and binds each of its names to that id
    pub fn remember(&self, record: &MetadataRecord) -> Result<(), CacheError> {
        self.by_id.set(record.id, record.clone())?;
        for name in record.names() {
            self.relation.set(name, record.id)?;
        }
        Ok(())
    }

    /// The cached record bound to `name`, if both halves are present
    ///
    /// A relation whose record has expired from the by-id cache yields `None`.
    pub fn find(&self, name: &str) -> Option<MetadataRecord> {
        let id = self.relation.get(name)?;
        self.by_id.get(id)
    }

    /// Deletes the file behind `kind`
    pub fn clear(&self, kind: CacheKind) -> Result<(), CacheError> {
        match kind {
            CacheKind::Relation => self.relation.clear(),
            CacheKind::Search => self.search.clear(),
            CacheKind::Id => self.by_id.clear(),
            CacheKind::Fail => self.failure.clear(),
        }
    }

    /// Reports path, policy, and visible entry count of every cache
    pub fn summaries(&self) -> Vec<CacheSummary> {
        CacheKind::ALL
            .iter()
            .map(|&kind| {
                let (path, ttl, entries) = match kind {
                    CacheKind::Relation => {
                        (self.relation.path(), self.relation.ttl(), self.relation.len())
                    }
                    CacheKind::Search => (self.search.path(), self.search.ttl(), self.search.len()),
                    CacheKind::Id => (self.by_id.path(), self.by_id.ttl(), self.by_id.len()),
                    CacheKind::Fail => {
                        (self.failure.path(), self.failure.ttl(), self.failure.len())
                    }
                };
                CacheSummary {
                    kind,
                    path: path.to_path_buf(),
                    ttl,
                    entries,
                }
            })
            .collect()
    }
}

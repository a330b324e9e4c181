//! Typed cache over a single file with a time-to-live policy
//!
//! `Cache<T>` stores the *whole* payload as one JSON document alongside the
//! time it was written. Whether the payload is still usable is decided on
//! every read according to the `Ttl` fixed at construction.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::clock::{Clock, SystemClock};
use super::store::{CacheError, FileStore};

/// How long a stored payload stays valid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// The payload never expires
    Never,
    /// The payload is valid while less than this much time has passed since it was written
    After(Duration),
}

impl Ttl {
    /// Whether a payload written at `cached_at` is still valid at `now`
    pub fn is_fresh(&self, cached_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            Ttl::Never => true,
            Ttl::After(ttl) => now - cached_at < *ttl,
        }
    }
}

/// On-disk wrapper pairing a payload with its write time
#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope<T> {
    /// When the payload was written
    cached_at: DateTime<Utc>,
    /// The payload itself
    data: T,
}

/// A persisted, expiring value of type `T`
///
/// Expired payloads read as absent but stay on disk until the next `set`
/// overwrites them.
pub struct Cache<T> {
    store: FileStore,
    ttl: Ttl,
    clock: Arc<dyn Clock>,
    _payload: PhantomData<fn() -> T>,
}

impl<T> Cache<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates a cache at `path` using wall-clock time
    pub fn new(path: impl Into<PathBuf>, ttl: Ttl) -> Self {
        Self::with_clock(path, ttl, Arc::new(SystemClock))
    }

    /// Creates a cache at `path` that reads time from `clock`
    pub fn with_clock(path: impl Into<PathBuf>, ttl: Ttl, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: FileStore::new(path),
            ttl,
            clock,
            _payload: PhantomData,
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// The expiration policy of this cache
    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    /// Returns the stored payload if present, readable, and fresh
    ///
    /// A missing, corrupt, or expired file all read as `None`.
    pub fn get(&self) -> Option<T> {
        let contents = match self.store.load() {
            Ok(Some(contents)) => contents,
            Ok(None) => return None,
            Err(e) => {
                debug!(path = %self.path().display(), error = %e, "cache unreadable");
                return None;
            }
        };

        let envelope: CacheEnvelope<T> = match serde_json::from_str(&contents) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!(path = %self.path().display(), error = %e, "cache corrupt");
                return None;
            }
        };

        if !self.ttl.is_fresh(envelope.cached_at, self.clock.now()) {
            debug!(
                path = %self.path().display(),
                cached_at = %envelope.cached_at,
                "cache expired"
            );
            return None;
        }

        Some(envelope.data)
    }

    /// Overwrites the stored payload and stamps it with the current time
    pub fn set(&self, value: &T) -> Result<(), CacheError> {
        let envelope = CacheEnvelope {
            cached_at: self.clock.now(),
            data: value,
        };
        let json = serde_json::to_string_pretty(&envelope)?;
        self.store.save(&json)
    }

    /// Deletes the backing file
    pub fn clear(&self) -> Result<(), CacheError> {
        self.store.remove()
    }
}

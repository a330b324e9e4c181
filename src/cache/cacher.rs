//! Per-key access over an expiring mapping
//!
//! A `Cacher` keeps a whole `key -> value` mapping in one `Cache` file and
//! normalizes every key before it touches the mapping, so that keys which
//! mean the same thing (different casing, extra spaces) share one entry.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use serde::{de::DeserializeOwned, Serialize};

use super::expiring::{Cache, Ttl};
use super::store::CacheError;

/// The persisted mapping. Keys are always stored already normalized.
pub type CacheBlob<K, T> = BTreeMap<K, T>;

type Normalizer<K> = Box<dyn Fn(K) -> K + Send + Sync>;

/// A namespaced key-value cache backed by a single expiring blob
///
/// Every mutation loads the blob, applies the change, and persists the
/// entire mapping before returning. Calls on one `Cacher` are serialized by
/// an internal lock; separate `Cacher`s never contend.
pub struct Cacher<K, T> {
    internal: Cache<CacheBlob<K, T>>,
    normalize: Normalizer<K>,
    lock: Mutex<()>,
}

impl<K, T> Cacher<K, T>
where
    K: Ord + Serialize + DeserializeOwned,
    T: Serialize + DeserializeOwned,
{
    /// Wraps `internal`, normalizing keys with `normalize`
    pub fn new(
        internal: Cache<CacheBlob<K, T>>,
        normalize: impl Fn(K) -> K + Send + Sync + 'static,
    ) -> Self {
        Self {
            internal,
            normalize: Box::new(normalize),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        self.internal.path()
    }

    /// Expiration policy of the backing blob
    pub fn ttl(&self) -> Ttl {
        self.internal.ttl()
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Looks up `key`
    ///
    /// Returns `None` if the key is unknown or the whole blob is absent or expired.
    pub fn get(&self, key: impl Into<K>) -> Option<T> {
        let key = (self.normalize)(key.into());
        let _guard = self.guard();
        self.internal.get()?.remove(&key)
    }

    /// Inserts or overwrites `key`
    ///
    /// An absent or expired blob is replaced by a fresh mapping holding only
    /// this entry.
    pub fn set(&self, key: impl Into<K>, value: T) -> Result<(), CacheError> {
        let key = (self.normalize)(key.into());
        let _guard = self.guard();
        let mut blob = self.internal.get().unwrap_or_default();
        blob.insert(key, value);
        self.internal.set(&blob)
    }

    /// Removes `key`
    ///
    /// Only an actual removal persists the blob. Deleting an unknown key, or
    /// deleting from an absent blob, writes nothing and leaves the blob's
    /// timestamp (and so the expiry of the other entries) unchanged.
    pub fn delete(&self, key: impl Into<K>) -> Result<(), CacheError> {
        let key = (self.normalize)(key.into());
        let _guard = self.guard();
        let Some(mut blob) = self.internal.get() else {
            return Ok(());
        };
        if blob.remove(&key).is_none() {
            return Ok(());
        }
        self.internal.set(&blob)
    }

    /// Number of entries currently visible (0 when absent or expired)
    pub fn len(&self) -> usize {
        let _guard = self.guard();
        self.internal.get().map_or(0, |blob| blob.len())
    }

    /// Whether no entries are currently visible
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deletes the backing file, dropping every entry
    pub fn clear(&self) -> Result<(), CacheError> {
        let _guard = self.guard();
        self.internal.clear()
    }
}

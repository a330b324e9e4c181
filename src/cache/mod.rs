//! Persistent, expiring caches
//!
//! Layers, from the bottom up:
//! - `FileStore` durably holds one blob and replaces it atomically.
//! - `Cache<T>` stamps a typed payload with its write time and hides it once
//!   its `Ttl` has passed.
//! - `Cacher<K, T>` keeps a normalized `K -> T` mapping inside a `Cache`.
//! - `MetadataCaches` wires up the four caches the application uses.

mod cacher;
mod clock;
mod expiring;
mod instances;
mod store;

pub use cacher::{CacheBlob, Cacher};
pub use clock::{Clock, ManualClock, SystemClock};
pub use expiring::{Cache, Ttl};
pub use instances::{
    fail_ttl, id_ttl, normalized_name, search_ttl, CacheKind, CacheSummary, MetadataCaches,
    FAIL_CACHE_FILE, ID_CACHE_FILE, RELATION_CACHE_FILE, SEARCH_CACHE_FILE,
};
pub use store::{CacheError, FileStore};

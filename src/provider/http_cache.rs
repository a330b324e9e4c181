//! SQLite-backed HTTP response cache, one per provider.
//!
//! Unlike the metadata caches, entries here expire one by one: each row
//! carries its own expiry time, set from the store TTL when written.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::cache::{Clock, SystemClock};

/// Errors raised by the HTTP cache
#[derive(Debug, Error)]
pub enum HttpCacheError {
    #[error("HTTP cache database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Failed to create HTTP cache directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to encode cached response: {0}")]
    Codec(String),
}

/// A stored HTTP response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Converts responses to and from the bytes kept in the store
pub trait Codec: Send + Sync {
    fn encode(&self, response: &CachedResponse) -> Result<Vec<u8>, HttpCacheError>;
    fn decode(&self, bytes: &[u8]) -> Result<CachedResponse, HttpCacheError>;
}

/// JSON encoding of responses
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, response: &CachedResponse) -> Result<Vec<u8>, HttpCacheError> {
        serde_json::to_vec(response).map_err(|e| HttpCacheError::Codec(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<CachedResponse, HttpCacheError> {
        serde_json::from_slice(bytes).map_err(|e| HttpCacheError::Codec(e.to_string()))
    }
}

/// Parameters for opening a store
#[derive(Debug, Clone)]
pub struct HttpCacheOptions {
    /// Lifetime of each entry
    pub ttl: Duration,
    /// Namespace inside the database, normally the provider name
    pub bucket: String,
    /// Database file
    pub path: PathBuf,
}

/// Per-provider HTTP response cache
///
/// Safe to share between concurrent requests; the connection sits behind a mutex.
pub struct HttpCacheStore {
    conn: Mutex<Connection>,
    options: HttpCacheOptions,
    codec: Box<dyn Codec>,
    clock: Arc<dyn Clock>,
}

impl HttpCacheStore {
    /// Opens (creating if needed) the store described by `options`
    pub fn open(options: HttpCacheOptions) -> Result<Self, HttpCacheError> {
        Self::open_with(options, Box::new(JsonCodec), Arc::new(SystemClock))
    }

    /// Opens the store with a custom codec and clock
    pub fn open_with(
        options: HttpCacheOptions,
        codec: Box<dyn Codec>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, HttpCacheError> {
        if let Some(parent) = options.path.parent() {
            fs::create_dir_all(parent).map_err(|source| HttpCacheError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(&options.path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;

            CREATE TABLE IF NOT EXISTS http_cache (
                bucket TEXT NOT NULL,
                key TEXT NOT NULL,
                value BLOB NOT NULL,
                expires_at INTEGER NOT NULL,
                PRIMARY KEY (bucket, key)
            );

            CREATE INDEX IF NOT EXISTS idx_http_cache_expires
                ON http_cache(bucket, expires_at);
            "#,
        )?;

        debug!(path = %options.path.display(), bucket = %options.bucket, "opened HTTP cache");

        Ok(Self {
            conn: Mutex::new(conn),
            options,
            codec,
            clock,
        })
    }

    /// Database file of this store
    pub fn path(&self) -> &Path {
        &self.options.path
    }

    /// Lifetime given to new entries
    pub fn ttl(&self) -> Duration {
        self.options.ttl
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn now_millis(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }

    /// Returns the response stored under `key` unless it has expired
    pub fn get(&self, key: &str) -> Result<Option<CachedResponse>, HttpCacheError> {
        let value: Option<Vec<u8>> = self
            .conn()
            .query_row(
                "SELECT value FROM http_cache WHERE bucket = ?1 AND key = ?2 AND expires_at > ?3",
                params![self.options.bucket, key, self.now_millis()],
                |row| row.get(0),
            )
            .optional()?;

        value.map(|bytes| self.codec.decode(&bytes)).transpose()
    }

    /// Stores `response` under `key`, expiring one TTL from now
    pub fn set(&self, key: &str, response: &CachedResponse) -> Result<(), HttpCacheError> {
        let bytes = self.codec.encode(response)?;
        let ttl_millis = i64::try_from(self.options.ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = self.now_millis().saturating_add(ttl_millis);

        self.conn().execute(
            "INSERT OR REPLACE INTO http_cache (bucket, key, value, expires_at) VALUES (?1, ?2, ?3, ?4)",
            params![self.options.bucket, key, bytes, expires_at],
        )?;
        Ok(())
    }

    /// Removes `key`; returns whether a row existed
    pub fn delete(&self, key: &str) -> Result<bool, HttpCacheError> {
        let removed = self.conn().execute(
            "DELETE FROM http_cache WHERE bucket = ?1 AND key = ?2",
            params![self.options.bucket, key],
        )?;
        Ok(removed > 0)
    }

    /// Deletes expired rows; returns how many were removed
    pub fn purge_expired(&self) -> Result<usize, HttpCacheError> {
        let removed = self.conn().execute(
            "DELETE FROM http_cache WHERE bucket = ?1 AND expires_at <= ?2",
            params![self.options.bucket, self.now_millis()],
        )?;
        if removed > 0 {
            debug!(bucket = %self.options.bucket, removed, "purged expired HTTP cache entries");
        }
        Ok(removed)
    }

    /// Number of unexpired entries
    pub fn len(&self) -> Result<usize, HttpCacheError> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM http_cache WHERE bucket = ?1 AND expires_at > ?2",
            params![self.options.bucket, self.now_millis()],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Whether the store holds no unexpired entries
    pub fn is_empty(&self) -> Result<bool, HttpCacheError> {
        Ok(self.len()? == 0)
    }
}

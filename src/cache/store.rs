//! Durable storage for a single serialized blob
//!
//! A `FileStore` owns one file path. Reads treat a missing file as a normal
//! outcome, and writes go through a temporary file in the same directory that
//! is renamed over the target, so readers never observe a partial write.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors raised by cache storage
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing the backing file failed
    #[error("Cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The payload could not be serialized
    #[error("Failed to serialize cache payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CacheError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A file holding one opaque blob
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates a store backed by `path`. Nothing is touched on disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored blob
    ///
    /// # Returns
    /// * `Ok(None)` if the file does not exist
    /// * `Ok(Some(contents))` if it was read
    /// * `Err` on any other I/O failure
    pub fn load(&self) -> Result<Option<String>, CacheError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::io(&self.path, e)),
        }
    }

    /// Atomically replaces the stored blob with `contents`
    ///
    /// Parent directories are created as needed.
    pub fn save(&self, contents: &str) -> Result<(), CacheError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| CacheError::io(&dir, e))?;

        let mut temp = NamedTempFile::new_in(&dir).map_err(|e| CacheError::io(&dir, e))?;
        temp.write_all(contents.as_bytes())
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| CacheError::io(temp.path(), e))?;
        temp.persist(&self.path)
            .map_err(|e| CacheError::io(&self.path, e.error))?;

        Ok(())
    }

    /// Removes the backing file. A missing file is not an error.
    pub fn remove(&self) -> Result<(), CacheError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(&self.path, e)),
        }
    }
}

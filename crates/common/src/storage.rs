//! Key-value storage over a single JSON document
//!
//! Every value lives under a string key in one top level JSON object.
//! Reads parse the whole file, writes rewrite the whole file. Writes land
//! in a temporary file next to the document and are renamed into place,
//! so an interrupted flush never leaves a truncated document behind.
//!
//! Locking only covers callers inside this process. Two processes writing
//! the same document race at whole-file granularity (last writer wins).

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("storage marshal error: {0}")]
    Marshal(#[from] serde_json::Error),
}

impl StorageError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonStore {
    /// Open (but do not create) the document at `path`.
    ///
    /// The file and its parent directory are created lazily on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the value stored under `key`.
    ///
    /// Returns `default` when the document does not exist, is empty, or does
    /// not carry `key`.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, StorageError> {
        let _guard = self.lock.read();
        let mut document = self.read_document()?;
        match document.remove(key) {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(default),
        }
    }

    /// Replace the value stored under `key`, leaving other keys untouched.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let _guard = self.lock.write();
        let mut document = self.read_document()?;
        document.insert(key.to_string(), serde_json::to_value(value)?);
        self.write_document(&document)
    }

    /// Drop `key` from the document. Missing keys are not an error.
    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.write();
        let mut document = self.read_document()?;
        if document.remove(key).is_some() {
            self.write_document(&document)?;
        }
        Ok(())
    }

    fn read_document(&self) -> Result<Map<String, Value>, StorageError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }
        Ok(serde_json::from_slice(&raw)?)
    }

    fn write_document(&self, document: &Map<String, Value>) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;

        let json = serde_json::to_vec_pretty(document)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| StorageError::io(&dir, e))?;
        tmp.write_all(&json)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| StorageError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| StorageError::io(&self.path, e.error))?;

        tracing::trace!(path = %self.path.display(), bytes = json.len(), "storage document written");
        Ok(())
    }
}

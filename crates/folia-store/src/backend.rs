//! Storage backends
//!
//! A backend stores one serialized document per collection key. Two
//! implementations are provided: an in-memory map (tests, ephemeral
//! deployments) and a directory of JSON files. Capacity exhaustion is a
//! first-class error so repositories can apply their truncate-and-retry
//! policy.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Backend-level storage failure
#[derive(Debug, Error)]
pub enum StorageError {
    /// The value does not fit in the space the backend has left
    #[error("storage capacity exceeded")]
    CapacityExceeded,

    /// Any other I/O failure
    #[error("storage i/o failure: {0}")]
    Io(String),
}

/// Keyed document storage
///
/// Operations are synchronous; repositories call them while holding their
/// collection lock, so a write is never torn by a concurrent writer.
pub trait StorageBackend: Send + Sync {
    /// Read the document stored under `key`, if any
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the document stored under `key`
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory backend with an optional per-document size cap
#[derive(Default)]
pub struct MemoryBackend {
    documents: Mutex<HashMap<String, String>>,
    max_document_bytes: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that rejects documents larger than `max_document_bytes`,
    /// used to exercise the capacity-exhaustion paths
    pub fn with_capacity(max_document_bytes: usize) -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            max_document_bytes: Some(max_document_bytes),
        }
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.documents.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(cap) = self.max_document_bytes {
            if value.len() > cap {
                return Err(StorageError::CapacityExceeded);
            }
        }
        self.documents.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-per-collection backend rooted at a data directory
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Create the backend, creating the data directory if needed
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(map_io)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(map_io(e)),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // Write-then-rename so a crash mid-write cannot corrupt the document
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{}.json.tmp", key));
        fs::write(&tmp, value).map_err(map_io)?;
        fs::rename(&tmp, &path).map_err(map_io)?;
        Ok(())
    }
}

fn map_io(e: io::Error) -> StorageError {
    // 28 = ENOSPC
    if e.raw_os_error() == Some(28) {
        StorageError::CapacityExceeded
    } else {
        StorageError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_backend_roundtrip() {
        let backend = MemoryBackend::new();
        assert!(backend.read("balances").unwrap().is_none());
        backend.write("balances", "{}").unwrap();
        assert_eq!(backend.read("balances").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_memory_backend_capacity() {
        let backend = MemoryBackend::with_capacity(4);
        backend.write("k", "abcd").unwrap();
        let err = backend.write("k", "abcde").unwrap_err();
        assert!(matches!(err, StorageError::CapacityExceeded));
        // the previous document survives a refused write
        assert_eq!(backend.read("k").unwrap().as_deref(), Some("abcd"));
    }

    #[test]
    fn test_file_backend_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path()).unwrap();
        assert!(backend.read("ledger").unwrap().is_none());
        backend.write("ledger", "[1,2,3]").unwrap();
        assert_eq!(backend.read("ledger").unwrap().as_deref(), Some("[1,2,3]"));
    }

    #[test]
    fn test_file_backend_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path()).unwrap();
        backend.write("doc", "old").unwrap();
        backend.write("doc", "new").unwrap();
        assert_eq!(backend.read("doc").unwrap().as_deref(), Some("new"));
    }
}

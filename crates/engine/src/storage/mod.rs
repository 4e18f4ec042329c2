//! Key/value persistence for small text blobs such as save slots.

mod atomic_io;

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("blob store I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid blob key '{0}': keys are non-empty ASCII alphanumerics, '-' or '_'")]
    InvalidKey(String),
}

pub trait BlobStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&mut self, key: &str, text: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// One `<key>.json` file per blob under a directory.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl BlobStore for FileBlobStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn write(&mut self, key: &str, text: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        atomic_io::replace_text(&path, text).map_err(|source| StoreError::Io { path, source })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        atomic_io::remove_if_present(&path).map_err(|source| StoreError::Io { path, source })
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: HashMap<String, String>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        Ok(self.blobs.get(key).cloned())
    }

    fn write(&mut self, key: &str, text: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.blobs.insert(key.to_string(), text.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.blobs.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips_and_removes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = FileBlobStore::new(dir.path().join("saves"));

        assert_eq!(store.read("slot").expect("read empty"), None);
        store.write("slot", "{\"a\":1}").expect("write");
        assert_eq!(
            store.read("slot").expect("read").as_deref(),
            Some("{\"a\":1}")
        );

        store.remove("slot").expect("remove");
        store.remove("slot").expect("remove twice");
        assert_eq!(store.read("slot").expect("read removed"), None);
    }

    #[test]
    fn keys_cannot_escape_the_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = FileBlobStore::new(dir.path());
        assert!(matches!(
            store.write("../outside", "x"),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(store.read(""), Err(StoreError::InvalidKey(_))));
    }

    #[test]
    fn memory_store_overwrites() {
        let mut store = MemoryBlobStore::new();
        store.write("slot", "one").expect("write");
        store.write("slot", "two").expect("overwrite");
        assert_eq!(store.len(), 1);
        assert_eq!(store.read("slot").expect("read").as_deref(), Some("two"));
    }
}

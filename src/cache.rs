//! Local byte storage for credentials and access tokens.
//!
//! Entries are addressed by a `(namespace, name)` pair. The on-disk backend keeps one
//! file per entry at `<root>/<namespace>/<name>`.

use async_trait::async_trait;
use std::{
    collections::HashMap,
    io::ErrorKind,
    path::PathBuf,
    sync::{Mutex, PoisonError},
};
use thiserror::Error;
use tokio::fs;

/// Namespace shared by every entry this application stores
pub const APP_NAMESPACE: &str = ".androidmanagement";

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache entry not found: {0}")]
    NotFound(String),

    #[error("Refusing to store an empty value in {0}")]
    EmptyValue(String),

    #[error("Cache I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to encode cache entry: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Namespaced byte storage.
///
/// `get` distinguishes a missing entry (`Ok(None)`) from a failed read (`Err`). Callers in
/// this crate downgrade both to "absent".
#[async_trait]
pub trait BlobCache: Send + Sync {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn put(&self, namespace: &str, name: &str, data: &[u8]) -> Result<(), CacheError>;

    /// Fails with [`CacheError::NotFound`] when nothing was stored.
    async fn delete(&self, namespace: &str, name: &str) -> Result<(), CacheError>;

    /// Human readable location of an entry, used when reporting where things were saved.
    fn location(&self, namespace: &str, name: &str) -> String;
}

/// File-per-entry cache rooted at a directory (usually the user's home).
pub struct FileBlobCache {
    root: PathBuf,
}

impl FileBlobCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn entry_path(&self, namespace: &str, name: &str) -> PathBuf {
        self.root.join(namespace).join(name)
    }
}

#[async_trait]
impl BlobCache for FileBlobCache {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.entry_path(namespace, name);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CacheError::Io { path, source }),
        }
    }

    async fn put(&self, namespace: &str, name: &str, data: &[u8]) -> Result<(), CacheError> {
        let dir = self.root.join(namespace);
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| CacheError::Io {
                path: dir.clone(),
                source,
            })?;

        // Write next to the target and rename so readers never observe a partial entry
        let path = dir.join(name);
        let staging = dir.join(format!("{name}.tmp"));
        fs::write(&staging, data)
            .await
            .map_err(|source| CacheError::Io {
                path: staging.clone(),
                source,
            })?;
        fs::rename(&staging, &path)
            .await
            .map_err(|source| CacheError::Io { path, source })
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), CacheError> {
        let path = self.entry_path(namespace, name);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(CacheError::NotFound(path.display().to_string()))
            }
            Err(source) => Err(CacheError::Io { path, source }),
        }
    }

    fn location(&self, namespace: &str, name: &str) -> String {
        self.entry_path(namespace, name).display().to_string()
    }
}

/// Process-local cache. Nothing survives the process.
#[derive(Default)]
pub struct MemoryBlobCache {
    entries: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryBlobCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<R>(&self, f: impl FnOnce(&mut HashMap<(String, String), Vec<u8>>) -> R) -> R {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut entries)
    }
}

#[async_trait]
impl BlobCache for MemoryBlobCache {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let key = (namespace.to_string(), name.to_string());
        Ok(self.with_entries(|entries| entries.get(&key).cloned()))
    }

    async fn put(&self, namespace: &str, name: &str, data: &[u8]) -> Result<(), CacheError> {
        let key = (namespace.to_string(), name.to_string());
        self.with_entries(|entries| entries.insert(key, data.to_vec()));
        Ok(())
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), CacheError> {
        let key = (namespace.to_string(), name.to_string());
        match self.with_entries(|entries| entries.remove(&key)) {
            Some(_) => Ok(()),
            None => Err(CacheError::NotFound(self.location(namespace, name))),
        }
    }

    fn location(&self, namespace: &str, name: &str) -> String {
        format!("memory:{namespace}/{name}")
    }
}

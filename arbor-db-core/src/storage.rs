//! Storage traits for reading and writing resource data
//!
//! The traits are runtime-agnostic and use `async_trait`; async lives at
//! the I/O seam only — codecs and reconstruction stay synchronous. Blobs
//! are addressed by plain path strings produced by the helpers below:
//!
//! - `{resource}/config.json` — resource configuration, written once
//! - `{resource}/revisions/{rev}.json` — revision manifest
//! - `{resource}/fragments/p{page}_r{rev}.bin` — page fragment
//! - `{resource}/head.json` — latest-revision pointer, written last
//!
//! Fragment blobs are immutable once written and may be cached and shared
//! freely across concurrent readers.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};

// ============================================================================
// Traits
// ============================================================================

/// Read-only storage operations
#[async_trait]
pub trait StorageRead: Debug + Send + Sync {
    /// Read raw bytes from the given path.
    ///
    /// Returns `Error::NotFound` if nothing exists there.
    async fn read_bytes(&self, path: &str) -> Result<Vec<u8>>;

    /// Check if a blob exists at the given path.
    async fn exists(&self, path: &str) -> Result<bool>;
}

/// Mutating storage operations
#[async_trait]
pub trait StorageWrite: Debug + Send + Sync {
    /// Write bytes to the given path, replacing any previous content.
    async fn write_bytes(&self, path: &str, bytes: &[u8]) -> Result<()>;

    /// Delete a blob. Deleting a non-existent blob succeeds.
    async fn delete(&self, path: &str) -> Result<()>;
}

/// Full storage capability marker
pub trait Storage: StorageRead + StorageWrite {}
impl<T: StorageRead + StorageWrite> Storage for T {}

// ============================================================================
// Path helpers
// ============================================================================

/// Path of the resource configuration blob.
pub fn config_path(resource: &str) -> String {
    format!("{resource}/config.json")
}

/// Path of the head (latest-revision) pointer.
pub fn head_path(resource: &str) -> String {
    format!("{resource}/head.json")
}

/// Path of a revision manifest.
pub fn manifest_path(resource: &str, revision: u64) -> String {
    format!("{resource}/revisions/{revision}.json")
}

/// Path of a page fragment blob.
pub fn fragment_path(resource: &str, page: u64, revision: u64) -> String {
    format!("{resource}/fragments/p{page}_r{revision}.bin")
}

/// Decode a JSON blob.
pub fn decode_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

// ============================================================================
// MemoryStorage
// ============================================================================

/// In-memory storage for tests and ephemeral resources.
///
/// Interior mutability (`Arc<RwLock<HashMap>>`) so clones share one store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    data: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.data.read().expect("RwLock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl StorageRead for MemoryStorage {
    async fn read_bytes(&self, path: &str) -> Result<Vec<u8>> {
        self.data
            .read()
            .expect("RwLock poisoned")
            .get(path)
            .cloned()
            .ok_or_else(|| Error::not_found(path))
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.data.read().expect("RwLock poisoned").contains_key(path))
    }
}

#[async_trait]
impl StorageWrite for MemoryStorage {
    async fn write_bytes(&self, path: &str, bytes: &[u8]) -> Result<()> {
        self.data
            .write()
            .expect("RwLock poisoned")
            .insert(path.to_owned(), bytes.to_vec());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.data.write().expect("RwLock poisoned").remove(path);
        Ok(())
    }
}

// ============================================================================
// FileStorage (native)
// ============================================================================

/// Filesystem storage rooted at a base directory (tokio::fs).
#[cfg(feature = "native")]
#[derive(Debug, Clone)]
pub struct FileStorage {
    base: std::path::PathBuf,
}

#[cfg(feature = "native")]
impl FileStorage {
    pub fn new(base: impl Into<std::path::PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn resolve(&self, path: &str) -> Result<std::path::PathBuf> {
        // Storage paths are forward-slash relative; reject escapes.
        if path.split('/').any(|seg| seg == ".." || seg.is_empty()) {
            return Err(Error::storage(format!("invalid storage path: {path}")));
        }
        Ok(self.base.join(path))
    }
}

#[cfg(feature = "native")]
#[async_trait]
impl StorageRead for FileStorage {
    async fn read_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path)?;
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::not_found(path))
            }
            Err(e) => Err(Error::io(e.to_string())),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let full = self.resolve(path)?;
        Ok(tokio::fs::try_exists(&full).await?)
    }
}

#[cfg(feature = "native")]
#[async_trait]
impl StorageWrite for FileStorage {
    async fn write_bytes(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, bytes).await?;
        tracing::debug!(path, bytes = bytes.len(), "wrote blob");
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(e.to_string())),
        }
    }
}

//! # Content-Addressed Archive Implementations
//!
//! Addresses are the lowercase-hex SHA-256 of the blob's bytes. Both
//! implementations verify nothing at retrieval beyond existence —
//! immutability means a stored blob can only ever resolve to the bytes
//! it was addressed by.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::RwLock;

use certledger_core::ContentAddress;

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors returned by content archive operations.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// No blob exists at the given address.
    #[error("no content at address {address}")]
    NotFound {
        /// The unresolvable address.
        address: ContentAddress,
    },

    /// The archive is unreachable or failed to persist. Retryable.
    #[error("archive unavailable: {0}")]
    Unavailable(String),

    /// Filesystem error from the local archive backend.
    #[error("archive io error: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Contract ────────────────────────────────────────────────────────

/// Client contract for the immutable content archive.
#[async_trait]
pub trait ContentArchive: Send + Sync {
    /// Store a blob, returning its content address. Idempotent:
    /// identical bytes always yield the same address, and re-storing
    /// them is a no-op.
    async fn put(&self, bytes: &[u8]) -> Result<ContentAddress, ArchiveError>;

    /// Resolve an address to a retrievable URI.
    async fn resolve(&self, address: &ContentAddress) -> Result<String, ArchiveError>;
}

/// Compute the content address for a blob: lowercase-hex SHA-256 of
/// its bytes.
pub fn content_address(bytes: &[u8]) -> ContentAddress {
    let digest = Sha256::digest(bytes);
    ContentAddress(digest.iter().map(|b| format!("{b:02x}")).collect())
}

// ─── In-Memory Archive ───────────────────────────────────────────────

/// In-memory archive for tests.
#[derive(Debug, Default)]
pub struct MemoryArchive {
    blobs: RwLock<HashMap<ContentAddress, Vec<u8>>>,
    fail_puts: RwLock<u32>,
}

impl MemoryArchive {
    /// An empty in-memory archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` put calls fail `Unavailable`. Test hook for
    /// driving the post-commit partial-failure window.
    pub async fn fail_next_puts(&self, n: u32) {
        *self.fail_puts.write().await = n;
    }

    /// Retrieve a stored blob directly (test helper).
    pub async fn get(&self, address: &ContentAddress) -> Option<Vec<u8>> {
        self.blobs.read().await.get(address).cloned()
    }
}

#[async_trait]
impl ContentArchive for MemoryArchive {
    async fn put(&self, bytes: &[u8]) -> Result<ContentAddress, ArchiveError> {
        {
            let mut remaining = self.fail_puts.write().await;
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ArchiveError::Unavailable("injected put failure".into()));
            }
        }
        let address = content_address(bytes);
        self.blobs
            .write()
            .await
            .entry(address.clone())
            .or_insert_with(|| bytes.to_vec());
        Ok(address)
    }

    async fn resolve(&self, address: &ContentAddress) -> Result<String, ArchiveError> {
        if self.blobs.read().await.contains_key(address) {
            Ok(format!("memory://{address}"))
        } else {
            Err(ArchiveError::NotFound {
                address: address.clone(),
            })
        }
    }
}

// ─── Filesystem Archive ──────────────────────────────────────────────

/// Filesystem archive: blobs at `root/<hex-address>.bin`.
#[derive(Debug, Clone)]
pub struct FsArchive {
    root: PathBuf,
}

impl FsArchive {
    /// An archive rooted at the given directory. The directory is
    /// created on first `put`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory of this archive.
    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn blob_path(&self, address: &ContentAddress) -> PathBuf {
        self.root.join(format!("{address}.bin"))
    }
}

#[async_trait]
impl ContentArchive for FsArchive {
    async fn put(&self, bytes: &[u8]) -> Result<ContentAddress, ArchiveError> {
        let address = content_address(bytes);
        let path = self.blob_path(&address);
        if tokio::fs::try_exists(&path).await? {
            return Ok(address);
        }
        tokio::fs::create_dir_all(&self.root).await?;
        // Write-then-rename so a crashed put never leaves a partial
        // blob at a resolvable address.
        let tmp = self.root.join(format!("{address}.tmp"));
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(address)
    }

    async fn resolve(&self, address: &ContentAddress) -> Result<String, ArchiveError> {
        let path = self.blob_path(address);
        if tokio::fs::try_exists(&path).await? {
            Ok(format!("file://{}", path.display()))
        } else {
            Err(ArchiveError::NotFound {
                address: address.clone(),
            })
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_address_is_deterministic() {
        assert_eq!(content_address(b"credential"), content_address(b"credential"));
        assert_ne!(content_address(b"credential"), content_address(b"other"));
        assert_eq!(content_address(b"credential").0.len(), 64);
    }

    #[tokio::test]
    async fn test_memory_put_resolve_roundtrip() {
        let archive = MemoryArchive::new();
        let address = archive.put(b"rendered document").await.unwrap();
        let uri = archive.resolve(&address).await.unwrap();
        assert_eq!(uri, format!("memory://{address}"));
        assert_eq!(
            archive.get(&address).await.unwrap(),
            b"rendered document".to_vec()
        );
    }

    #[tokio::test]
    async fn test_memory_put_is_idempotent() {
        let archive = MemoryArchive::new();
        let a = archive.put(b"same bytes").await.unwrap();
        let b = archive.put(b"same bytes").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_memory_resolve_unknown_is_not_found() {
        let archive = MemoryArchive::new();
        let missing = content_address(b"never stored");
        assert!(matches!(
            archive.resolve(&missing).await,
            Err(ArchiveError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_memory_injected_failure_is_transient() {
        let archive = MemoryArchive::new();
        archive.fail_next_puts(1).await;
        assert!(matches!(
            archive.put(b"doc").await,
            Err(ArchiveError::Unavailable(_))
        ));
        archive.put(b"doc").await.unwrap();
    }

    #[tokio::test]
    async fn test_fs_put_resolve_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FsArchive::new(dir.path());
        let address = archive.put(b"rendered document").await.unwrap();
        let uri = archive.resolve(&address).await.unwrap();
        assert!(uri.starts_with("file://"));
        assert!(uri.contains(address.0.as_str()));
    }

    #[tokio::test]
    async fn test_fs_put_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FsArchive::new(dir.path());
        let a = archive.put(b"same bytes").await.unwrap();
        let b = archive.put(b"same bytes").await.unwrap();
        assert_eq!(a, b);
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn test_fs_resolve_unknown_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FsArchive::new(dir.path());
        let missing = content_address(b"never stored");
        assert!(matches!(
            archive.resolve(&missing).await,
            Err(ArchiveError::NotFound { .. })
        ));
    }
}

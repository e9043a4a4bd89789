//! Content store for object and part bytes.
//!
//! The [`ContentStore`] trait is pure blob storage: it stores raw bytes under
//! an opaque [`ContentHandle`] and knows nothing about buckets, keys or
//! uploads. [`InMemoryStorage`] is the in-process implementation.
//!
//! # Spillover to Disk
//!
//! Content below a configurable threshold is kept in memory as [`Bytes`].
//! Larger content is written to a temporary file. Range reads against a
//! spilled entry seek into the file and read only the requested bytes, and
//! [`ContentStore::concat`] streams its sources into a new file, so neither
//! path needs the whole object in memory. Spill files are removed when the
//! last reference to their entry is dropped.

use std::fmt;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use dashmap::DashMap;
use digest::Digest;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, trace, warn};

use crate::checksums::{self, Md5Digest};
use crate::config::DEFAULT_MAX_MEMORY_OBJECT_SIZE;
use crate::error::{S3ServiceError, S3ServiceResult};

/// Buffer size used when streaming spilled content.
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// ContentHandle / WriteReceipt
// ---------------------------------------------------------------------------

/// Opaque identifier of a stored blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHandle(uuid::Uuid);

impl ContentHandle {
    pub(crate) fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for ContentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Result of writing content to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    /// Handle of the new entry.
    pub handle: ContentHandle,
    /// Size in bytes.
    pub size: u64,
    /// Raw MD5 digest of the content.
    pub md5: Md5Digest,
    /// Quoted hex MD5, the content's ETag.
    pub etag: String,
}

impl WriteReceipt {
    fn new(handle: ContentHandle, size: u64, md5: Md5Digest) -> Self {
        Self {
            handle,
            size,
            md5,
            etag: checksums::etag_from_digest(&md5),
        }
    }
}

// ---------------------------------------------------------------------------
// ContentStore
// ---------------------------------------------------------------------------

/// Blob storage keyed by opaque handles.
#[async_trait]
pub trait ContentStore: Send + Sync + fmt::Debug {
    /// Store `data` and return its receipt.
    async fn put(&self, data: Bytes) -> S3ServiceResult<WriteReceipt>;

    /// Read an entry, optionally restricted to the inclusive byte range
    /// `(start, end)`.
    ///
    /// Fails with [`S3ServiceError::ContentNotFound`] when the handle is
    /// absent and [`S3ServiceError::InvalidRange`] when the range does not
    /// fit the entry.
    async fn get(
        &self,
        handle: &ContentHandle,
        range: Option<(u64, u64)>,
    ) -> S3ServiceResult<Bytes>;

    /// Create a new entry holding the given entries' content, in order.
    async fn concat(&self, handles: &[ContentHandle]) -> S3ServiceResult<WriteReceipt>;

    /// Remove an entry. Removing an absent handle is a no-op.
    fn delete(&self, handle: &ContentHandle);

    /// Size of an entry, if present.
    fn size(&self, handle: &ContentHandle) -> Option<u64>;

    /// Number of stored entries.
    fn len(&self) -> usize;

    /// Whether the store holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    fn reset(&self);
}

// ---------------------------------------------------------------------------
// StoredData
// ---------------------------------------------------------------------------

/// Internal representation of a stored entry.
///
/// When a [`StoredData::OnDisk`] value is dropped, its file is removed.
enum StoredData {
    /// Small content kept entirely in memory.
    InMemory {
        /// The raw bytes.
        data: Bytes,
    },
    /// Large content spilled to a file.
    OnDisk {
        /// Path to the spill file.
        path: PathBuf,
        /// Size of the content in bytes.
        size: u64,
    },
}

impl fmt::Debug for StoredData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InMemory { data } => f
                .debug_struct("InMemory")
                .field("size", &data.len())
                .finish(),
            Self::OnDisk { path, size } => f
                .debug_struct("OnDisk")
                .field("path", path)
                .field("size", size)
                .finish(),
        }
    }
}

impl Drop for StoredData {
    fn drop(&mut self) {
        if let Self::OnDisk { path, .. } = self {
            match std::fs::remove_file(path.as_path()) {
                Ok(()) => trace!(path = %path.display(), "removed spill file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove spill file"),
            }
        }
    }
}

impl StoredData {
    fn size(&self) -> u64 {
        match self {
            Self::InMemory { data } => data.len() as u64,
            Self::OnDisk { size, .. } => *size,
        }
    }

    /// Read the inclusive range `start..=end`.
    async fn read_range(&self, start: u64, end: u64) -> S3ServiceResult<Bytes> {
        match self {
            Self::InMemory { data } => {
                let start = usize::try_from(start).map_err(|_| S3ServiceError::InvalidRange)?;
                let end = usize::try_from(end).map_err(|_| S3ServiceError::InvalidRange)?;
                Ok(data.slice(start..=end))
            }
            Self::OnDisk { path, .. } => {
                let len = usize::try_from(end - start + 1)
                    .map_err(|_| S3ServiceError::InvalidRange)?;
                let mut file = tokio::fs::File::open(path).await?;
                file.seek(SeekFrom::Start(start)).await?;
                let mut buf = BytesMut::zeroed(len);
                file.read_exact(&mut buf).await?;
                Ok(buf.freeze())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// InMemoryStorage
// ---------------------------------------------------------------------------

/// In-memory content store with automatic spillover to files for large
/// entries.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use s3lite_core::storage::{ContentStore, InMemoryStorage};
///
/// # tokio_test::block_on(async {
/// let storage = InMemoryStorage::new(1024);
/// let receipt = storage.put(Bytes::from("hello")).await.unwrap();
/// assert_eq!(receipt.size, 5);
///
/// let data = storage.get(&receipt.handle, Some((1, 3))).await.unwrap();
/// assert_eq!(data.as_ref(), b"ell");
/// # });
/// ```
pub struct InMemoryStorage {
    entries: DashMap<ContentHandle, Arc<StoredData>>,
    /// Max size in bytes for in-memory entries before spilling to disk.
    max_memory_size: usize,
    /// Directory for spill files; the system temp dir when unset.
    spill_dir: Option<PathBuf>,
}

impl fmt::Debug for InMemoryStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryStorage")
            .field("entries", &self.entries.len())
            .field("max_memory_size", &self.max_memory_size)
            .field("spill_dir", &self.spill_dir)
            .finish()
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MEMORY_OBJECT_SIZE)
    }
}

impl InMemoryStorage {
    /// Create a store that spills entries larger than `max_memory_size` bytes
    /// into the system temp directory.
    #[must_use]
    pub fn new(max_memory_size: usize) -> Self {
        debug!(max_memory_size, "creating InMemoryStorage");
        Self {
            entries: DashMap::new(),
            max_memory_size,
            spill_dir: None,
        }
    }

    /// Spill into `dir` instead of the system temp directory.
    #[must_use]
    pub fn with_spill_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spill_dir = Some(dir.into());
        self
    }

    /// The in-memory threshold.
    #[must_use]
    pub fn max_memory_size(&self) -> usize {
        self.max_memory_size
    }

    /// Whether the entry is held in a spill file. Used by tests.
    #[must_use]
    pub fn is_spilled(&self, handle: &ContentHandle) -> bool {
        self.entries
            .get(handle)
            .is_some_and(|e| matches!(e.value().as_ref(), StoredData::OnDisk { .. }))
    }

    fn lookup(&self, handle: &ContentHandle) -> S3ServiceResult<Arc<StoredData>> {
        self.entries
            .get(handle)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| S3ServiceError::ContentNotFound {
                handle: handle.to_string(),
            })
    }

    fn insert(&self, data: StoredData, md5: Md5Digest) -> WriteReceipt {
        let handle = ContentHandle::generate();
        let size = data.size();
        self.entries.insert(handle, Arc::new(data));
        WriteReceipt::new(handle, size, md5)
    }

    /// Create a kept spill file. The returned [`StoredData`] owns the path
    /// and removes it on drop, so a failed write cleans up after itself.
    fn create_spill_file(&self) -> S3ServiceResult<(tokio::fs::File, StoredData)> {
        let builder = {
            let mut b = tempfile::Builder::new();
            b.prefix("s3lite-");
            b
        };
        let temp = match &self.spill_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        let (file, path) = temp.keep().map_err(|e| S3ServiceError::Io(e.error))?;
        Ok((
            tokio::fs::File::from_std(file),
            StoredData::OnDisk { path, size: 0 },
        ))
    }

    async fn spill_to_disk(&self, data: &[u8]) -> S3ServiceResult<StoredData> {
        let (mut file, mut stored) = self.create_spill_file()?;
        file.write_all(data).await?;
        file.flush().await?;
        if let StoredData::OnDisk { path, size } = &mut stored {
            *size = data.len() as u64;
            trace!(path = %path.display(), size = *size, "spilled content to disk");
        }
        Ok(stored)
    }

    /// Stream the sources into a new spill file, hashing along the way.
    async fn concat_to_disk(
        &self,
        sources: &[Arc<StoredData>],
    ) -> S3ServiceResult<(StoredData, Md5Digest)> {
        let (mut file, mut stored) = self.create_spill_file()?;
        let mut hasher = <md5::Md5 as Digest>::new();
        let mut written = 0u64;

        for source in sources {
            match source.as_ref() {
                StoredData::InMemory { data } => {
                    Digest::update(&mut hasher, data);
                    file.write_all(data).await?;
                    written += data.len() as u64;
                }
                StoredData::OnDisk { path, .. } => {
                    written += copy_file_into(path, &mut file, &mut hasher).await?;
                }
            }
        }
        file.flush().await?;

        if let StoredData::OnDisk { size, .. } = &mut stored {
            *size = written;
        }
        let mut md5 = [0u8; 16];
        md5.copy_from_slice(&Digest::finalize(hasher));
        Ok((stored, md5))
    }
}

async fn copy_file_into(
    path: &Path,
    out: &mut tokio::fs::File,
    hasher: &mut md5::Md5,
) -> S3ServiceResult<u64> {
    let mut src = tokio::fs::File::open(path).await?;
    let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
    let mut copied = 0u64;
    loop {
        let n = src.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        Digest::update(hasher, &buf[..n]);
        out.write_all(&buf[..n]).await?;
        copied += n as u64;
    }
    Ok(copied)
}

#[async_trait]
impl ContentStore for InMemoryStorage {
    #[tracing::instrument(skip_all, fields(size = data.len()))]
    async fn put(&self, data: Bytes) -> S3ServiceResult<WriteReceipt> {
        let md5 = checksums::md5_digest(&data);
        let stored = if data.len() > self.max_memory_size {
            self.spill_to_disk(&data).await?
        } else {
            StoredData::InMemory { data }
        };
        let receipt = self.insert(stored, md5);
        trace!(handle = %receipt.handle, "stored content");
        Ok(receipt)
    }

    #[tracing::instrument(skip_all, fields(handle = %handle))]
    async fn get(
        &self,
        handle: &ContentHandle,
        range: Option<(u64, u64)>,
    ) -> S3ServiceResult<Bytes> {
        let entry = self.lookup(handle)?;
        let size = entry.size();
        match range {
            Some((start, end)) => {
                if start > end || end >= size {
                    return Err(S3ServiceError::InvalidRange);
                }
                entry.read_range(start, end).await
            }
            None if size == 0 => Ok(Bytes::new()),
            None => entry.read_range(0, size - 1).await,
        }
    }

    #[tracing::instrument(skip_all, fields(sources = handles.len()))]
    async fn concat(&self, handles: &[ContentHandle]) -> S3ServiceResult<WriteReceipt> {
        let sources = handles
            .iter()
            .map(|h| self.lookup(h))
            .collect::<S3ServiceResult<Vec<_>>>()?;
        let total: u64 = sources.iter().map(|s| s.size()).sum();

        let fits_in_memory = usize::try_from(total).is_ok_and(|t| t <= self.max_memory_size);
        let (stored, md5) = if fits_in_memory {
            let mut combined = BytesMut::new();
            for source in &sources {
                let size = source.size();
                if size > 0 {
                    combined.extend_from_slice(&source.read_range(0, size - 1).await?);
                }
            }
            let md5 = checksums::md5_digest(&combined);
            (
                StoredData::InMemory {
                    data: combined.freeze(),
                },
                md5,
            )
        } else {
            self.concat_to_disk(&sources).await?
        };

        let receipt = self.insert(stored, md5);
        debug!(handle = %receipt.handle, size = receipt.size, "assembled content");
        Ok(receipt)
    }

    fn delete(&self, handle: &ContentHandle) {
        if self.entries.remove(handle).is_some() {
            trace!(handle = %handle, "deleted content");
        }
    }

    fn size(&self, handle: &ContentHandle) -> Option<u64> {
        self.entries.get(handle).map(|e| e.value().size())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn reset(&self) {
        debug!("resetting content store");
        self.entries.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Multipart upload state and the coordinator that drives it.
//!
//! Each [`MultipartUpload`] keeps its parts in a `DashMap` keyed by part
//! number, so uploads of distinct parts proceed in parallel. The upload's
//! status sits behind a `parking_lot::RwLock`: part insertion happens under
//! the read lock after checking `InProgress`, while completion and abort
//! flip the status under the write lock. No part can therefore be inserted
//! once the upload has left `InProgress`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::checksums::{Md5Digest, compute_multipart_etag};
use crate::error::{S3ServiceError, S3ServiceResult};
use crate::storage::{ContentHandle, ContentStore};
use crate::utils::{generate_upload_id, normalize_etag};
use crate::validation::validate_part_number;

use super::bucket::S3Bucket;
use super::object::S3Object;

/// Lifecycle of a multipart upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    /// Accepting parts.
    InProgress,
    /// Assembled into an object.
    Completed,
    /// Abandoned; parts released.
    Aborted,
}

/// A single uploaded part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPart {
    /// The part number (1-based).
    pub part_number: u32,
    /// Quoted hex MD5 of the part's bytes.
    pub etag: String,
    /// Raw MD5 of the part's bytes.
    pub md5: Md5Digest,
    /// Size in bytes.
    pub size: u64,
    /// When this part was uploaded.
    pub last_modified: DateTime<Utc>,
    /// Handle of the part's content.
    pub handle: ContentHandle,
}

/// An upload and its parts.
#[derive(Debug)]
pub struct MultipartUpload {
    /// Unique identifier for this upload.
    pub upload_id: String,
    /// Target bucket.
    pub bucket: String,
    /// Identity of the target bucket instance.
    pub bucket_id: uuid::Uuid,
    /// Target key.
    pub key: String,
    /// When the upload was initiated.
    pub initiated: DateTime<Utc>,
    /// Content type for the assembled object.
    pub content_type: String,
    status: RwLock<UploadStatus>,
    parts: DashMap<u32, UploadPart>,
}

impl MultipartUpload {
    fn new(bucket: &S3Bucket, key: &str, content_type: String) -> Self {
        Self {
            upload_id: generate_upload_id(),
            bucket: bucket.name.clone(),
            bucket_id: bucket.id,
            key: key.to_owned(),
            initiated: Utc::now(),
            content_type,
            status: RwLock::new(UploadStatus::InProgress),
            parts: DashMap::new(),
        }
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> UploadStatus {
        *self.status.read()
    }

    /// Parts uploaded so far, sorted by part number.
    #[must_use]
    pub fn sorted_parts(&self) -> Vec<UploadPart> {
        let mut parts: Vec<UploadPart> = self.parts.iter().map(|p| p.value().clone()).collect();
        parts.sort_by_key(|p| p.part_number);
        parts
    }

    fn take_handles(&self) -> Vec<ContentHandle> {
        let numbers: Vec<u32> = self.parts.iter().map(|p| *p.key()).collect();
        numbers
            .into_iter()
            .filter_map(|n| self.parts.remove(&n).map(|(_, part)| part.handle))
            .collect()
    }
}

/// A part reference supplied to [`MultipartCoordinator::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartRef {
    /// Part number.
    pub part_number: u32,
    /// ETag the caller received for the part, quoted or not.
    pub etag: String,
}

/// Registry of in-progress multipart uploads.
#[derive(Debug)]
pub struct MultipartCoordinator {
    uploads: DashMap<String, Arc<MultipartUpload>>,
    storage: Arc<dyn ContentStore>,
    max_part_number: u32,
}

impl MultipartCoordinator {
    /// Create a coordinator writing parts into `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn ContentStore>, max_part_number: u32) -> Self {
        Self {
            uploads: DashMap::new(),
            storage,
            max_part_number,
        }
    }

    /// Number of uploads currently in progress.
    #[must_use]
    pub fn len(&self) -> usize {
        self.uploads.len()
    }

    /// Whether no upload is in progress.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.uploads.is_empty()
    }

    /// Start an upload for `bucket`/`key`.
    ///
    /// Fails with `NoSuchBucket` when the bucket is deleted before the upload
    /// is registered. The mark is checked again after registering, so an
    /// upload either lands before the deletion (and is aborted by
    /// [`Self::abort_bucket`]) or is withdrawn here.
    pub fn initiate(
        &self,
        bucket: &S3Bucket,
        key: &str,
        content_type: String,
    ) -> S3ServiceResult<Arc<MultipartUpload>> {
        let no_such_bucket = || S3ServiceError::NoSuchBucket {
            bucket: bucket.name.clone(),
        };
        if bucket.is_deleted() {
            return Err(no_such_bucket());
        }
        let upload = Arc::new(MultipartUpload::new(bucket, key, content_type));
        self.uploads
            .insert(upload.upload_id.clone(), Arc::clone(&upload));
        if bucket.is_deleted() {
            *upload.status.write() = UploadStatus::Aborted;
            self.discard(&upload);
            return Err(no_such_bucket());
        }
        debug!(
            bucket = %bucket.name,
            key = %key,
            upload_id = %upload.upload_id,
            "multipart upload initiated"
        );
        Ok(upload)
    }

    /// Look up an in-progress upload addressed by bucket, key and id.
    pub fn get(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> S3ServiceResult<Arc<MultipartUpload>> {
        self.uploads
            .get(upload_id)
            .map(|entry| Arc::clone(entry.value()))
            .filter(|upload| upload.bucket == bucket && upload.key == key)
            .ok_or_else(|| S3ServiceError::NoSuchUpload {
                upload_id: upload_id.to_owned(),
            })
    }

    /// Store one part, replacing any earlier part with the same number.
    pub async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u32,
        data: bytes::Bytes,
    ) -> S3ServiceResult<UploadPart> {
        validate_part_number(part_number, self.max_part_number)?;
        let upload = self.get(bucket, key, upload_id)?;
        if upload.status() != UploadStatus::InProgress {
            return Err(no_such_upload(upload_id));
        }

        let receipt = self.storage.put(data).await?;
        let part = UploadPart {
            part_number,
            etag: receipt.etag,
            md5: receipt.md5,
            size: receipt.size,
            last_modified: Utc::now(),
            handle: receipt.handle,
        };

        let replaced = {
            let status = upload.status.read();
            if *status != UploadStatus::InProgress {
                drop(status);
                self.storage.delete(&part.handle);
                return Err(no_such_upload(upload_id));
            }
            upload.parts.insert(part_number, part.clone())
        };
        if let Some(old) = replaced {
            self.storage.delete(&old.handle);
        }

        debug!(upload_id = %upload_id, part_number, size = part.size, "part uploaded");
        Ok(part)
    }

    /// Assemble the referenced parts into an object and publish it.
    ///
    /// On success the upload is discarded and every part's content, used or
    /// not, is released. A completion that fails validation leaves the upload
    /// in progress.
    pub async fn complete(
        &self,
        bucket: &S3Bucket,
        key: &str,
        upload_id: &str,
        parts: &[PartRef],
    ) -> S3ServiceResult<S3Object> {
        let upload = self.get(&bucket.name, key, upload_id)?;
        if parts.is_empty() {
            return Err(S3ServiceError::InvalidArgument {
                message: "You must specify at least one part".to_owned(),
            });
        }
        if parts.windows(2).any(|w| w[0].part_number >= w[1].part_number) {
            return Err(S3ServiceError::InvalidPartOrder);
        }

        let _guard = bucket.lock_key(key).await;

        let (handles, digests) = {
            let mut status = upload.status.write();
            if *status != UploadStatus::InProgress {
                return Err(no_such_upload(upload_id));
            }
            let mut handles = Vec::with_capacity(parts.len());
            let mut digests = Vec::with_capacity(parts.len());
            for requested in parts {
                let stored = upload
                    .parts
                    .get(&requested.part_number)
                    .filter(|p| normalize_etag(&p.etag) == normalize_etag(&requested.etag))
                    .ok_or(S3ServiceError::InvalidPart {
                        part_number: requested.part_number,
                    })?;
                handles.push(stored.handle);
                digests.push(stored.md5);
            }
            *status = UploadStatus::Completed;
            (handles, digests)
        };

        let receipt = match self.storage.concat(&handles).await {
            Ok(receipt) => receipt,
            Err(e) => {
                *upload.status.write() = UploadStatus::InProgress;
                return Err(e);
            }
        };

        let object = S3Object {
            key: key.to_owned(),
            handle: receipt.handle,
            size: receipt.size,
            etag: compute_multipart_etag(&digests),
            last_modified: Utc::now(),
            content_type: upload.content_type.clone(),
            parts_count: u32::try_from(parts.len()).ok(),
        };

        let published = bucket.put_object(object.clone());
        self.discard(&upload);
        match published {
            Ok(previous) => {
                if let Some(previous) = previous {
                    self.storage.delete(&previous.handle);
                }
                debug!(
                    bucket = %bucket.name,
                    key = %key,
                    upload_id = %upload_id,
                    size = object.size,
                    etag = %object.etag,
                    "multipart upload completed"
                );
                Ok(object)
            }
            Err(e) => {
                self.storage.delete(&object.handle);
                Err(e)
            }
        }
    }

    /// Abort an upload and release its parts.
    pub fn abort(&self, bucket: &str, key: &str, upload_id: &str) -> S3ServiceResult<()> {
        let upload = self.get(bucket, key, upload_id)?;
        {
            let mut status = upload.status.write();
            if *status != UploadStatus::InProgress {
                return Err(no_such_upload(upload_id));
            }
            *status = UploadStatus::Aborted;
        }
        self.discard(&upload);
        debug!(bucket = %bucket, key = %key, upload_id = %upload_id, "multipart upload aborted");
        Ok(())
    }

    /// Abort every in-progress upload targeting this instance of `bucket`.
    /// Uploads of a later bucket with the same name are left alone. Returns
    /// how many uploads were aborted.
    pub fn abort_bucket(&self, bucket: &S3Bucket) -> usize {
        let targets: Vec<Arc<MultipartUpload>> = self
            .uploads
            .iter()
            .filter(|entry| entry.value().bucket_id == bucket.id)
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut aborted = 0;
        for upload in targets {
            match self.abort(&upload.bucket, &upload.key, &upload.upload_id) {
                Ok(()) => aborted += 1,
                Err(e) => {
                    warn!(upload_id = %upload.upload_id, error = %e, "failed to abort upload");
                }
            }
        }
        aborted
    }

    /// In-progress uploads of `bucket` whose key starts with `prefix`,
    /// sorted by key then initiation time.
    #[must_use]
    pub fn list_uploads(&self, bucket: &str, prefix: &str) -> Vec<Arc<MultipartUpload>> {
        let mut uploads: Vec<Arc<MultipartUpload>> = self
            .uploads
            .iter()
            .filter(|entry| {
                let upload = entry.value();
                upload.bucket == bucket
                    && upload.key.starts_with(prefix)
                    && upload.status() == UploadStatus::InProgress
            })
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        uploads.sort_by(|a, b| a.key.cmp(&b.key).then(a.initiated.cmp(&b.initiated)));
        uploads
    }

    /// Drop every upload and release its parts.
    pub fn reset(&self) {
        let uploads: Vec<Arc<MultipartUpload>> =
            self.uploads.iter().map(|e| Arc::clone(e.value())).collect();
        for upload in uploads {
            *upload.status.write() = UploadStatus::Aborted;
            self.discard(&upload);
        }
    }

    fn discard(&self, upload: &MultipartUpload) {
        self.uploads.remove(&upload.upload_id);
        for handle in upload.take_handles() {
            self.storage.delete(&handle);
        }
    }
}

fn no_such_upload(upload_id: &str) -> S3ServiceError {
    S3ServiceError::NoSuchUpload {
        upload_id: upload_id.to_owned(),
    }
}

//! Per-bucket state.
//!
//! An [`S3Bucket`] owns its [`ObjectIndex`] behind a `parking_lot::RwLock`
//! together with a `deleted` mark. Every writer publishes into the index
//! under the write lock and checks the mark there, and bucket deletion
//! checks emptiness and sets the mark under the same lock. A put therefore
//! either lands before the deletion (which then sees a non-empty bucket) or
//! observes the deletion and fails with `NoSuchBucket`.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::error::{S3ServiceError, S3ServiceResult};

use super::index::{FullListing, ListResult, ObjectIndex};
use super::locks::{KeyGuard, KeyLocks};
use super::object::S3Object;

#[derive(Debug, Default)]
struct BucketObjects {
    index: ObjectIndex,
    deleted: bool,
}

/// A bucket and its object index.
#[derive(Debug)]
pub struct S3Bucket {
    /// Bucket name.
    pub name: String,
    /// Creation time.
    pub creation_date: DateTime<Utc>,
    /// Region the bucket reports.
    pub region: String,
    /// Identity of this bucket instance. A bucket recreated under the same
    /// name gets a new one.
    pub id: uuid::Uuid,
    objects: RwLock<BucketObjects>,
    key_locks: KeyLocks,
}

impl S3Bucket {
    /// Create an empty bucket.
    #[must_use]
    pub fn new(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            creation_date: Utc::now(),
            region: region.into(),
            id: uuid::Uuid::new_v4(),
            objects: RwLock::new(BucketObjects::default()),
            key_locks: KeyLocks::default(),
        }
    }

    fn no_such_bucket(&self) -> S3ServiceError {
        S3ServiceError::NoSuchBucket {
            bucket: self.name.clone(),
        }
    }

    /// Wait for exclusive write access to `key`.
    pub async fn lock_key(&self, key: &str) -> KeyGuard<'_> {
        self.key_locks.lock(key).await
    }

    /// Whether the bucket has been deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.objects.read().deleted
    }

    /// Look up an object's metadata.
    pub fn get_object(&self, key: &str) -> S3ServiceResult<S3Object> {
        let objects = self.objects.read();
        if objects.deleted {
            return Err(self.no_such_bucket());
        }
        objects
            .index
            .get(key)
            .cloned()
            .ok_or_else(|| S3ServiceError::NoSuchKey {
                key: key.to_owned(),
            })
    }

    /// Publish an object into the index. Returns the displaced object so the
    /// caller can release its content.
    pub fn put_object(&self, object: S3Object) -> S3ServiceResult<Option<S3Object>> {
        let mut objects = self.objects.write();
        if objects.deleted {
            return Err(self.no_such_bucket());
        }
        Ok(objects.index.put(object))
    }

    /// Remove an object from the index. Returns it if it was present.
    pub fn delete_object(&self, key: &str) -> S3ServiceResult<Option<S3Object>> {
        let mut objects = self.objects.write();
        if objects.deleted {
            return Err(self.no_such_bucket());
        }
        Ok(objects.index.delete(key))
    }

    /// List one page of the index. See [`ObjectIndex::list`].
    pub fn list_objects(
        &self,
        prefix: &str,
        delimiter: Option<&str>,
        start_after: Option<&str>,
        max_keys: usize,
    ) -> S3ServiceResult<ListResult> {
        let objects = self.objects.read();
        if objects.deleted {
            return Err(self.no_such_bucket());
        }
        Ok(objects.index.list(prefix, delimiter, start_after, max_keys))
    }

    /// Advance a full listing by one page under a short read lock.
    pub fn next_page(&self, listing: &mut FullListing) -> Option<Vec<S3Object>> {
        let objects = self.objects.read();
        listing.next_page(&objects.index)
    }

    /// Number of objects in the bucket.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.read().index.len()
    }

    /// Mark the bucket deleted if, and only if, it holds no objects.
    ///
    /// The emptiness check and the mark happen under one write lock.
    pub fn mark_deleted_if_empty(&self) -> S3ServiceResult<()> {
        let mut objects = self.objects.write();
        if objects.deleted {
            return Err(self.no_such_bucket());
        }
        if !objects.index.is_empty() {
            return Err(S3ServiceError::BucketNotEmpty {
                bucket: self.name.clone(),
            });
        }
        objects.deleted = true;
        Ok(())
    }

    /// Mark the bucket deleted and hand back every object it held.
    pub fn drain(&self) -> Vec<S3Object> {
        let mut objects = self.objects.write();
        objects.deleted = true;
        objects.index.drain()
    }
}

//! Top-level S3 service state.
//!
//! [`S3ServiceState`] is the bucket registry. Bucket names are unique; the
//! registry hands out `Arc<S3Bucket>` so that object operations never hold a
//! `DashMap` shard lock across an await point.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, info};

use crate::error::{S3ServiceError, S3ServiceResult};

use super::bucket::S3Bucket;

/// Summary of a bucket as returned by [`S3ServiceState::list_buckets`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSummary {
    /// Bucket name.
    pub name: String,
    /// Creation time.
    pub creation_date: DateTime<Utc>,
}

/// Registry of all buckets.
pub struct S3ServiceState {
    buckets: DashMap<String, Arc<S3Bucket>>,
}

impl std::fmt::Debug for S3ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ServiceState")
            .field("bucket_count", &self.buckets.len())
            .finish_non_exhaustive()
    }
}

impl Default for S3ServiceState {
    fn default() -> Self {
        Self::new()
    }
}

impl S3ServiceState {
    /// Create a new, empty service state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: DashMap::new(),
        }
    }

    /// Create a new bucket.
    ///
    /// # Errors
    ///
    /// Returns [`S3ServiceError::BucketAlreadyExists`] if the name is taken.
    pub fn create_bucket(&self, name: &str, region: &str) -> S3ServiceResult<Arc<S3Bucket>> {
        match self.buckets.entry(name.to_owned()) {
            Entry::Occupied(_) => Err(S3ServiceError::BucketAlreadyExists {
                bucket: name.to_owned(),
            }),
            Entry::Vacant(slot) => {
                let bucket = Arc::new(S3Bucket::new(name, region));
                slot.insert(Arc::clone(&bucket));
                info!(bucket = %name, region = %region, "bucket created");
                Ok(bucket)
            }
        }
    }

    /// Delete an empty bucket.
    ///
    /// # Errors
    ///
    /// - [`S3ServiceError::NoSuchBucket`] if the bucket does not exist.
    /// - [`S3ServiceError::BucketNotEmpty`] if the bucket still holds objects.
    pub fn delete_bucket(&self, name: &str) -> S3ServiceResult<Arc<S3Bucket>> {
        let bucket = self.get_bucket(name)?;
        bucket.mark_deleted_if_empty()?;
        self.buckets
            .remove_if(name, |_, current| Arc::ptr_eq(current, &bucket));

        info!(bucket = %name, "bucket deleted");
        Ok(bucket)
    }

    /// Get a bucket by name.
    ///
    /// # Errors
    ///
    /// Returns [`S3ServiceError::NoSuchBucket`] if the bucket does not exist.
    pub fn get_bucket(&self, name: &str) -> S3ServiceResult<Arc<S3Bucket>> {
        self.buckets
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| S3ServiceError::NoSuchBucket {
                bucket: name.to_owned(),
            })
    }

    /// List all buckets sorted by name.
    #[must_use]
    pub fn list_buckets(&self) -> Vec<BucketSummary> {
        let mut buckets: Vec<BucketSummary> = self
            .buckets
            .iter()
            .map(|entry| BucketSummary {
                name: entry.key().clone(),
                creation_date: entry.value().creation_date,
            })
            .collect();
        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        buckets
    }

    /// Check whether a bucket exists.
    #[must_use]
    pub fn bucket_exists(&self, name: &str) -> bool {
        self.buckets.contains_key(name)
    }

    /// Remove every bucket and hand them back so the caller can release
    /// their content.
    pub fn reset(&self) -> Vec<Arc<S3Bucket>> {
        debug!("resetting all S3 service state");
        let names: Vec<String> = self.buckets.iter().map(|e| e.key().clone()).collect();
        names
            .into_iter()
            .filter_map(|name| self.buckets.remove(&name).map(|(_, bucket)| bucket))
            .collect()
    }
}

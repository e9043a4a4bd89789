//! S3 service state management.
//!
//! This module provides the in-memory state for the S3 service:
//!
//! - [`S3ServiceState`] -- bucket registry
//! - [`S3Bucket`] -- per-bucket object index and key locks
//! - [`ObjectIndex`] / [`FullListing`] -- ordered key index and its listings
//! - [`S3Object`] -- object metadata
//! - [`MultipartCoordinator`] / [`MultipartUpload`] / [`UploadPart`] --
//!   multipart upload tracking
//!
//! # Thread Safety
//!
//! All types are `Send + Sync`. Concurrent access is handled via:
//!
//! - `DashMap` for the bucket table, the upload table and each upload's parts
//! - `parking_lot::RwLock` for each bucket's index and each upload's status
//! - per-key `tokio::sync::Mutex` for writers of the same key

pub(crate) mod bucket;
pub(crate) mod index;
pub(crate) mod locks;
pub(crate) mod multipart;
pub(crate) mod object;
pub(crate) mod service;

pub use bucket::S3Bucket;
pub use index::{FULL_LISTING_PAGE_SIZE, FullListing, ListResult, ObjectIndex};
pub use locks::{KeyGuard, KeyLocks};
pub use multipart::{MultipartCoordinator, MultipartUpload, PartRef, UploadPart, UploadStatus};
pub use object::{DEFAULT_CONTENT_TYPE, S3Object};
pub use service::{BucketSummary, S3ServiceState};

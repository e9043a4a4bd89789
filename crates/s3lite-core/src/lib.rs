//! In-process S3-compatible storage engine.
//!
//! This crate implements the bucket, object and multipart-upload semantics
//! of S3: MD5 ETags, composite multipart ETags, prefix/delimiter listings
//! with pagination, byte-range reads and non-empty bucket protection. It has
//! no network layer; callers drive [`S3Lite`] directly.
//!
//! # Architecture
//!
//! ```text
//!   S3Lite (ops: bucket, object, list, multipart)
//!        |
//!        +-------------------------+
//!        v                         v
//!   S3ServiceState            MultipartCoordinator
//!   (buckets, ObjectIndex,    (uploads, parts)
//!    key locks)                    |
//!        |                         |
//!        +------------+------------+
//!                     v
//!          ContentStore (in-memory + spillover)
//! ```
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use s3lite_core::S3Lite;
//! use s3lite_core::config::S3Config;
//! use s3lite_core::model::{CreateBucketInput, GetObjectInput, PutObjectInput};
//!
//! # tokio_test::block_on(async {
//! let s3 = S3Lite::new(S3Config::default());
//! s3.create_bucket(CreateBucketInput::builder().bucket("docs").build())
//!     .await
//!     .unwrap();
//! s3.put_object(
//!     PutObjectInput::builder()
//!         .bucket("docs")
//!         .key("file-0.txt")
//!         .body(Bytes::from_static(b"TEST"))
//!         .build(),
//! )
//! .await
//! .unwrap();
//!
//! let out = s3
//!     .get_object(GetObjectInput::builder().bucket("docs").key("file-0.txt").build())
//!     .await
//!     .unwrap();
//! assert_eq!(out.e_tag, "\"033bd94b1168d7e4f0d644c3c95e35bf\"");
//! # });
//! ```

pub mod checksums;
pub mod config;
pub mod error;
pub mod model;
mod ops;
pub mod provider;
pub mod state;
pub mod storage;
pub mod utils;
pub mod validation;

pub use config::S3Config;
pub use error::{S3Error, S3ErrorCode, S3Result};
pub use provider::S3Lite;

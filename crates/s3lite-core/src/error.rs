//! S3-specific error types.
//!
//! Internal layers return [`S3ServiceError`], a domain error enum. At the
//! service boundary every variant is converted into an [`S3Error`], which
//! carries a machine-readable [`S3ErrorCode`], a human-readable message and
//! the HTTP status code a transport would answer with.
//!
//! # Usage
//!
//! ```
//! use s3lite_core::error::{S3Error, S3ErrorCode, S3ServiceError};
//!
//! let err = S3ServiceError::NoSuchBucket {
//!     bucket: "my-bucket".to_owned(),
//! };
//! let s3_err: S3Error = err.into();
//! assert_eq!(s3_err.code, S3ErrorCode::NoSuchBucket);
//! assert_eq!(s3_err.status_code, http::StatusCode::NOT_FOUND);
//! ```

use std::fmt;

/// Well-known S3 error codes produced by this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum S3ErrorCode {
    /// BadDigest error.
    BadDigest,
    /// BucketAlreadyExists error.
    BucketAlreadyExists,
    /// BucketNotEmpty error.
    BucketNotEmpty,
    /// InternalError error.
    #[default]
    InternalError,
    /// InvalidArgument error.
    InvalidArgument,
    /// InvalidBucketName error.
    InvalidBucketName,
    /// InvalidDigest error.
    InvalidDigest,
    /// InvalidPart error.
    InvalidPart,
    /// InvalidPartOrder error.
    InvalidPartOrder,
    /// InvalidRange error.
    InvalidRange,
    /// KeyTooLongError error.
    KeyTooLongError,
    /// NoSuchBucket error.
    NoSuchBucket,
    /// NoSuchKey error.
    NoSuchKey,
    /// NoSuchUpload error.
    NoSuchUpload,
}

impl S3ErrorCode {
    /// Returns the error code as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadDigest => "BadDigest",
            Self::BucketAlreadyExists => "BucketAlreadyExists",
            Self::BucketNotEmpty => "BucketNotEmpty",
            Self::InternalError => "InternalError",
            Self::InvalidArgument => "InvalidArgument",
            Self::InvalidBucketName => "InvalidBucketName",
            Self::InvalidDigest => "InvalidDigest",
            Self::InvalidPart => "InvalidPart",
            Self::InvalidPartOrder => "InvalidPartOrder",
            Self::InvalidRange => "InvalidRange",
            Self::KeyTooLongError => "KeyTooLongError",
            Self::NoSuchBucket => "NoSuchBucket",
            Self::NoSuchKey => "NoSuchKey",
            Self::NoSuchUpload => "NoSuchUpload",
        }
    }

    /// Returns the default HTTP status code for this error.
    #[must_use]
    pub fn default_status_code(&self) -> http::StatusCode {
        match self {
            Self::BadDigest
            | Self::InvalidArgument
            | Self::InvalidBucketName
            | Self::InvalidDigest
            | Self::InvalidPart
            | Self::InvalidPartOrder
            | Self::KeyTooLongError => http::StatusCode::BAD_REQUEST,
            Self::NoSuchBucket | Self::NoSuchKey | Self::NoSuchUpload => {
                http::StatusCode::NOT_FOUND
            }
            Self::BucketAlreadyExists | Self::BucketNotEmpty => http::StatusCode::CONFLICT,
            Self::InvalidRange => http::StatusCode::RANGE_NOT_SATISFIABLE,
            Self::InternalError => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the default human-readable message for this error.
    #[must_use]
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::BadDigest => "The Content-MD5 you specified did not match what we received.",
            Self::BucketAlreadyExists => "The requested bucket name is not available.",
            Self::BucketNotEmpty => "The bucket you tried to delete is not empty",
            Self::InternalError => "We encountered an internal error. Please try again.",
            Self::InvalidArgument => "Invalid Argument",
            Self::InvalidBucketName => "The specified bucket is not valid.",
            Self::InvalidDigest => "The Content-MD5 you specified is not valid.",
            Self::InvalidPart => {
                "One or more of the specified parts could not be found. \
                 The part may not have been uploaded, or the specified entity tag may not \
                 match the part's entity tag."
            }
            Self::InvalidPartOrder => "The list of parts was not in ascending order.",
            Self::InvalidRange => "The requested range is not satisfiable",
            Self::KeyTooLongError => "Your key is too long",
            Self::NoSuchBucket => "The specified bucket does not exist",
            Self::NoSuchKey => "The specified key does not exist.",
            Self::NoSuchUpload => {
                "The specified upload does not exist. The upload ID may be invalid, \
                 or the upload may have been aborted or completed."
            }
        }
    }
}

impl fmt::Display for S3ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured S3 error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Error {
    /// The error code.
    pub code: S3ErrorCode,
    /// A human-readable error message.
    pub message: String,
    /// The resource that caused the error.
    pub resource: Option<String>,
    /// The HTTP status code.
    pub status_code: http::StatusCode,
}

impl fmt::Display for S3Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S3Error({}): {}", self.code, self.message)
    }
}

impl std::error::Error for S3Error {}

impl S3Error {
    /// Create a new S3Error from an error code.
    #[must_use]
    pub fn new(code: S3ErrorCode) -> Self {
        Self::with_message(code, code.default_message())
    }

    /// Create a new S3Error with a custom message.
    #[must_use]
    pub fn with_message(code: S3ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: message.into(),
            code,
            resource: None,
        }
    }

    /// Set the resource that caused this error.
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Create a NoSuchBucket error.
    #[must_use]
    pub fn no_such_bucket(bucket_name: impl Into<String>) -> Self {
        Self::new(S3ErrorCode::NoSuchBucket).with_resource(bucket_name)
    }

    /// Create a NoSuchKey error.
    #[must_use]
    pub fn no_such_key(key: impl Into<String>) -> Self {
        Self::new(S3ErrorCode::NoSuchKey).with_resource(key)
    }

    /// Create a NoSuchUpload error.
    #[must_use]
    pub fn no_such_upload(upload_id: impl Into<String>) -> Self {
        Self::new(S3ErrorCode::NoSuchUpload).with_resource(upload_id)
    }
}

/// S3 service error type.
///
/// Each variant corresponds to a well-known S3 error code, except
/// [`S3ServiceError::ContentNotFound`] and the I/O variants which are
/// internal and surface as `InternalError`.
#[derive(Debug, thiserror::Error)]
pub enum S3ServiceError {
    // -----------------------------------------------------------------------
    // Bucket errors
    // -----------------------------------------------------------------------
    /// The specified bucket does not exist.
    #[error("The specified bucket does not exist")]
    NoSuchBucket {
        /// The bucket name that was not found.
        bucket: String,
    },

    /// The bucket name is already taken.
    #[error("The requested bucket name is not available: {bucket}")]
    BucketAlreadyExists {
        /// The bucket name that already exists.
        bucket: String,
    },

    /// The bucket is not empty and cannot be deleted.
    #[error("The bucket you tried to delete is not empty: {bucket}")]
    BucketNotEmpty {
        /// The bucket name that is not empty.
        bucket: String,
    },

    // -----------------------------------------------------------------------
    // Object / key errors
    // -----------------------------------------------------------------------
    /// The specified key does not exist.
    #[error("The specified key does not exist.")]
    NoSuchKey {
        /// The key that was not found.
        key: String,
    },

    // -----------------------------------------------------------------------
    // Multipart upload errors
    // -----------------------------------------------------------------------
    /// The specified multipart upload does not exist, or is no longer in
    /// progress.
    #[error("The specified upload does not exist: {upload_id}")]
    NoSuchUpload {
        /// The upload ID that was not found.
        upload_id: String,
    },

    /// The list of parts was not in ascending order.
    #[error("The list of parts was not in ascending order.")]
    InvalidPartOrder,

    /// A referenced part is missing or its ETag does not match.
    #[error("One or more of the specified parts could not be found: part {part_number}")]
    InvalidPart {
        /// The offending part number.
        part_number: u32,
    },

    // -----------------------------------------------------------------------
    // Validation errors
    // -----------------------------------------------------------------------
    /// The specified bucket name is not valid.
    #[error("Invalid bucket name: {name}: {reason}")]
    InvalidBucketName {
        /// The invalid bucket name.
        name: String,
        /// The reason for the error.
        reason: String,
    },

    /// An argument provided is invalid.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// The requested range is not satisfiable.
    #[error("The requested range is not satisfiable")]
    InvalidRange,

    /// The key is too long.
    #[error("Your key is too long")]
    KeyTooLong,

    // -----------------------------------------------------------------------
    // Digest errors
    // -----------------------------------------------------------------------
    /// The Content-MD5 you specified is invalid.
    #[error("The Content-MD5 you specified is not valid.")]
    InvalidDigest,

    /// The Content-MD5 you specified did not match what we received.
    #[error("The Content-MD5 you specified did not match what we received.")]
    BadDigest,

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------
    /// A content handle is not present in the content store.
    #[error("content not found: {handle}")]
    ContentNotFound {
        /// The missing handle.
        handle: String,
    },

    /// Storage I/O failure.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl S3ServiceError {
    /// Map this error to the corresponding [`S3ErrorCode`].
    #[must_use]
    pub fn error_code(&self) -> S3ErrorCode {
        match self {
            Self::NoSuchBucket { .. } => S3ErrorCode::NoSuchBucket,
            Self::BucketAlreadyExists { .. } => S3ErrorCode::BucketAlreadyExists,
            Self::BucketNotEmpty { .. } => S3ErrorCode::BucketNotEmpty,
            Self::NoSuchKey { .. } => S3ErrorCode::NoSuchKey,
            Self::NoSuchUpload { .. } => S3ErrorCode::NoSuchUpload,
            Self::InvalidPartOrder => S3ErrorCode::InvalidPartOrder,
            Self::InvalidPart { .. } => S3ErrorCode::InvalidPart,
            Self::InvalidBucketName { .. } => S3ErrorCode::InvalidBucketName,
            Self::InvalidArgument { .. } => S3ErrorCode::InvalidArgument,
            Self::InvalidRange => S3ErrorCode::InvalidRange,
            Self::KeyTooLong => S3ErrorCode::KeyTooLongError,
            Self::InvalidDigest => S3ErrorCode::InvalidDigest,
            Self::BadDigest => S3ErrorCode::BadDigest,
            Self::ContentNotFound { .. } | Self::Io(_) | Self::Internal(_) => {
                S3ErrorCode::InternalError
            }
        }
    }

    /// The resource name attached to the wire error, if any.
    fn resource(&self) -> Option<&str> {
        match self {
            Self::NoSuchBucket { bucket }
            | Self::BucketAlreadyExists { bucket }
            | Self::BucketNotEmpty { bucket } => Some(bucket),
            Self::NoSuchKey { key } => Some(key),
            Self::NoSuchUpload { upload_id } => Some(upload_id),
            Self::InvalidBucketName { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Convert this error into an [`S3Error`].
    #[must_use]
    pub fn into_s3_error(self) -> S3Error {
        S3Error::from(self)
    }
}

impl From<S3ServiceError> for S3Error {
    fn from(err: S3ServiceError) -> Self {
        let code = err.error_code();
        let resource = err.resource().map(ToOwned::to_owned);
        let message = err.to_string();
        let mut s3_err = S3Error::with_message(code, message);
        s3_err.resource = resource;
        s3_err
    }
}

/// Convenience result type for S3 service operations.
pub type S3ServiceResult<T> = Result<T, S3ServiceError>;

/// Result type of the public [`crate::S3Lite`] API.
pub type S3Result<T> = Result<T, S3Error>;

//! Object metadata.

use chrono::{DateTime, Utc};

use crate::storage::ContentHandle;

/// Content type recorded when a writer does not supply one.
pub const DEFAULT_CONTENT_TYPE: &str = "binary/octet-stream";

/// Metadata of a stored object. The bytes live in the content store under
/// [`S3Object::handle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Object {
    /// The object key (unique within its bucket).
    pub key: String,
    /// Handle of the object's content.
    pub handle: ContentHandle,
    /// Size in bytes.
    pub size: u64,
    /// Quoted ETag: the MD5 of the content, or the composite multipart ETag.
    pub etag: String,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
    /// MIME type.
    pub content_type: String,
    /// Number of parts for objects assembled by a multipart upload.
    pub parts_count: Option<u32>,
}

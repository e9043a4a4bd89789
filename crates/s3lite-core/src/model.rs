//! Request and response types of the [`crate::S3Lite`] API.
//!
//! Inputs are built with `TypedBuilder`; outputs serialize with serde to the
//! S3 wire field names (`ETag`, `KeyCount`, `NextContinuationToken`, ...).

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use typed_builder::TypedBuilder;

use crate::utils::ByteRange;

/// Key encoding requested for listing responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingType {
    /// Keys are returned verbatim.
    #[default]
    Path,
    /// Keys, prefixes, delimiter and markers are percent-encoded.
    Url,
}

// ---------------------------------------------------------------------------
// Buckets
// ---------------------------------------------------------------------------

/// Input of `create_bucket`.
#[derive(Debug, Clone, TypedBuilder)]
pub struct CreateBucketInput {
    /// Bucket name.
    #[builder(setter(into))]
    pub bucket: String,
    /// Region; the configured default when absent.
    #[builder(default, setter(into, strip_option))]
    pub region: Option<String>,
}

/// Output of `create_bucket`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateBucketOutput {
    /// `/<bucket>`.
    pub location: String,
}

/// Output of `head_bucket`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HeadBucketOutput {
    /// Region of the bucket.
    pub bucket_region: String,
}

/// A bucket entry in [`ListBucketsOutput`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Bucket {
    /// Bucket name.
    pub name: String,
    /// Creation time.
    pub creation_date: DateTime<Utc>,
}

/// Output of `list_buckets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListBucketsOutput {
    /// Buckets sorted by name.
    pub buckets: Vec<Bucket>,
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

/// Input of `put_object`.
#[derive(Debug, Clone, TypedBuilder)]
pub struct PutObjectInput {
    /// Bucket name.
    #[builder(setter(into))]
    pub bucket: String,
    /// Object key.
    #[builder(setter(into))]
    pub key: String,
    /// Object content.
    #[builder(default, setter(into))]
    pub body: Bytes,
    /// MIME type; `binary/octet-stream` when absent.
    #[builder(default, setter(into, strip_option))]
    pub content_type: Option<String>,
    /// Base64 MD5 of the body, verified when present.
    #[builder(default, setter(into, strip_option))]
    pub content_md5: Option<String>,
}

/// Output of `put_object`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutObjectOutput {
    /// Quoted MD5 of the body.
    pub e_tag: String,
    /// Size of the body in bytes.
    pub size: u64,
}

/// Input of `get_object`.
#[derive(Debug, Clone, TypedBuilder)]
pub struct GetObjectInput {
    /// Bucket name.
    #[builder(setter(into))]
    pub bucket: String,
    /// Object key.
    #[builder(setter(into))]
    pub key: String,
    /// Optional byte range.
    #[builder(default, setter(strip_option))]
    pub range: Option<ByteRange>,
}

/// Output of `get_object`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetObjectOutput {
    /// The returned bytes: the whole object or the requested range.
    #[serde(skip)]
    pub body: Bytes,
    /// Length of `body`.
    pub content_length: u64,
    /// `bytes <start>-<end>/<size>` for ranged reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_range: Option<String>,
    /// MIME type.
    pub content_type: String,
    /// ETag of the whole object.
    pub e_tag: String,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
    /// Part count of multipart objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parts_count: Option<u32>,
}

/// Input of `head_object`.
#[derive(Debug, Clone, TypedBuilder)]
pub struct HeadObjectInput {
    /// Bucket name.
    #[builder(setter(into))]
    pub bucket: String,
    /// Object key.
    #[builder(setter(into))]
    pub key: String,
}

/// Output of `head_object`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HeadObjectOutput {
    /// Object size.
    pub content_length: u64,
    /// MIME type.
    pub content_type: String,
    /// ETag of the object.
    pub e_tag: String,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
    /// Part count of multipart objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parts_count: Option<u32>,
}

/// Input of `delete_object`.
#[derive(Debug, Clone, TypedBuilder)]
pub struct DeleteObjectInput {
    /// Bucket name.
    #[builder(setter(into))]
    pub bucket: String,
    /// Object key.
    #[builder(setter(into))]
    pub key: String,
}

/// Input of `delete_objects`.
#[derive(Debug, Clone, TypedBuilder)]
pub struct DeleteObjectsInput {
    /// Bucket name.
    #[builder(setter(into))]
    pub bucket: String,
    /// Keys to delete.
    pub keys: Vec<String>,
    /// Omit successful deletions from the response.
    #[builder(default)]
    pub quiet: bool,
}

/// A successful entry of [`DeleteObjectsOutput`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeletedObject {
    /// Deleted key.
    pub key: String,
}

/// A failed entry of [`DeleteObjectsOutput`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteError {
    /// Key that could not be deleted.
    pub key: String,
    /// S3 error code.
    pub code: String,
    /// Error message.
    pub message: String,
}

/// Output of `delete_objects`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteObjectsOutput {
    /// Deleted keys (empty in quiet mode).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deleted: Vec<DeletedObject>,
    /// Per-key failures.
    #[serde(rename = "Error", skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<DeleteError>,
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// An object entry in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Object {
    /// Object key, encoded per the request's encoding type.
    pub key: String,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
    /// ETag of the object.
    pub e_tag: String,
    /// Size in bytes.
    pub size: u64,
}

/// A collapsed group of keys in a delimited listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommonPrefix {
    /// The shared prefix, including the delimiter.
    pub prefix: String,
}

/// Input of `list_objects` (v1).
#[derive(Debug, Clone, TypedBuilder)]
pub struct ListObjectsInput {
    /// Bucket name.
    #[builder(setter(into))]
    pub bucket: String,
    /// Only keys starting with this prefix.
    #[builder(default, setter(into, strip_option))]
    pub prefix: Option<String>,
    /// Group keys by this delimiter after the prefix.
    #[builder(default, setter(into, strip_option))]
    pub delimiter: Option<String>,
    /// Start after this key.
    #[builder(default, setter(into, strip_option))]
    pub marker: Option<String>,
    /// Page size.
    #[builder(default, setter(strip_option))]
    pub max_keys: Option<usize>,
    /// Response key encoding.
    #[builder(default, setter(strip_option))]
    pub encoding_type: Option<EncodingType>,
}

/// Output of `list_objects` (v1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListObjectsOutput {
    /// Bucket name.
    pub name: String,
    /// Requested prefix.
    pub prefix: String,
    /// Requested marker.
    pub marker: String,
    /// Cursor for the next page; present only for truncated delimited
    /// listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_marker: Option<String>,
    /// Requested delimiter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    /// Effective page size.
    pub max_keys: usize,
    /// Whether more entries follow.
    pub is_truncated: bool,
    /// Objects in this page; absent when empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<Object>,
    /// Collapsed prefixes in this page.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub common_prefixes: Vec<CommonPrefix>,
    /// Echoed encoding type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding_type: Option<EncodingType>,
}

/// Input of `list_objects_v2`.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ListObjectsV2Input {
    /// Bucket name.
    #[builder(setter(into))]
    pub bucket: String,
    /// Only keys starting with this prefix.
    #[builder(default, setter(into, strip_option))]
    pub prefix: Option<String>,
    /// Group keys by this delimiter after the prefix.
    #[builder(default, setter(into, strip_option))]
    pub delimiter: Option<String>,
    /// Token from a previous truncated page.
    #[builder(default, setter(into, strip_option))]
    pub continuation_token: Option<String>,
    /// Start after this key (ignored when a token is given).
    #[builder(default, setter(into, strip_option))]
    pub start_after: Option<String>,
    /// Page size.
    #[builder(default, setter(strip_option))]
    pub max_keys: Option<usize>,
    /// Response key encoding.
    #[builder(default, setter(strip_option))]
    pub encoding_type: Option<EncodingType>,
}

/// Output of `list_objects_v2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListObjectsV2Output {
    /// Bucket name.
    pub name: String,
    /// Requested prefix.
    pub prefix: String,
    /// Requested delimiter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    /// Effective page size.
    pub max_keys: usize,
    /// Objects plus common prefixes in this page.
    pub key_count: usize,
    /// Whether more entries follow.
    pub is_truncated: bool,
    /// Objects in this page.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<Object>,
    /// Collapsed prefixes in this page.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub common_prefixes: Vec<CommonPrefix>,
    /// Echoed continuation token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
    /// Token for the next page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_continuation_token: Option<String>,
    /// Echoed start-after key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_after: Option<String>,
    /// Echoed encoding type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding_type: Option<EncodingType>,
}

// ---------------------------------------------------------------------------
// Multipart
// ---------------------------------------------------------------------------

/// Input of `create_multipart_upload`.
#[derive(Debug, Clone, TypedBuilder)]
pub struct CreateMultipartUploadInput {
    /// Bucket name.
    #[builder(setter(into))]
    pub bucket: String,
    /// Key of the object to assemble.
    #[builder(setter(into))]
    pub key: String,
    /// MIME type of the assembled object.
    #[builder(default, setter(into, strip_option))]
    pub content_type: Option<String>,
}

/// Output of `create_multipart_upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateMultipartUploadOutput {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// New upload id.
    pub upload_id: String,
}

/// Input of `upload_part`.
#[derive(Debug, Clone, TypedBuilder)]
pub struct UploadPartInput {
    /// Bucket name.
    #[builder(setter(into))]
    pub bucket: String,
    /// Object key.
    #[builder(setter(into))]
    pub key: String,
    /// Upload id.
    #[builder(setter(into))]
    pub upload_id: String,
    /// Part number, 1-based.
    pub part_number: u32,
    /// Part content.
    #[builder(default, setter(into))]
    pub body: Bytes,
}

/// Output of `upload_part`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UploadPartOutput {
    /// Quoted MD5 of the part.
    pub e_tag: String,
}

/// A part reference in [`CompleteMultipartUploadInput`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    /// Part number.
    pub part_number: u32,
    /// ETag returned by `upload_part`.
    pub e_tag: String,
}

impl CompletedPart {
    /// Create a part reference.
    #[must_use]
    pub fn new(part_number: u32, e_tag: impl Into<String>) -> Self {
        Self {
            part_number,
            e_tag: e_tag.into(),
        }
    }
}

/// Input of `complete_multipart_upload`.
#[derive(Debug, Clone, TypedBuilder)]
pub struct CompleteMultipartUploadInput {
    /// Bucket name.
    #[builder(setter(into))]
    pub bucket: String,
    /// Object key.
    #[builder(setter(into))]
    pub key: String,
    /// Upload id.
    #[builder(setter(into))]
    pub upload_id: String,
    /// Parts to assemble, ascending by part number.
    pub parts: Vec<CompletedPart>,
}

/// Output of `complete_multipart_upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompleteMultipartUploadOutput {
    /// `/<bucket>/<key>`.
    pub location: String,
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Composite ETag.
    pub e_tag: String,
    /// Size of the assembled object.
    pub size: u64,
}

/// Input of `abort_multipart_upload`.
#[derive(Debug, Clone, TypedBuilder)]
pub struct AbortMultipartUploadInput {
    /// Bucket name.
    #[builder(setter(into))]
    pub bucket: String,
    /// Object key.
    #[builder(setter(into))]
    pub key: String,
    /// Upload id.
    #[builder(setter(into))]
    pub upload_id: String,
}

/// Input of `list_parts`.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ListPartsInput {
    /// Bucket name.
    #[builder(setter(into))]
    pub bucket: String,
    /// Object key.
    #[builder(setter(into))]
    pub key: String,
    /// Upload id.
    #[builder(setter(into))]
    pub upload_id: String,
    /// Page size.
    #[builder(default, setter(strip_option))]
    pub max_parts: Option<usize>,
    /// List parts after this number.
    #[builder(default, setter(strip_option))]
    pub part_number_marker: Option<u32>,
}

/// A part entry in [`ListPartsOutput`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Part {
    /// Part number.
    pub part_number: u32,
    /// Quoted MD5 of the part.
    pub e_tag: String,
    /// Size in bytes.
    pub size: u64,
    /// Upload time.
    pub last_modified: DateTime<Utc>,
}

/// Output of `list_parts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListPartsOutput {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Upload id.
    pub upload_id: String,
    /// Echoed marker.
    pub part_number_marker: u32,
    /// Marker for the next page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_part_number_marker: Option<u32>,
    /// Effective page size.
    pub max_parts: usize,
    /// Whether more parts follow.
    pub is_truncated: bool,
    /// Parts sorted by number.
    #[serde(rename = "Part")]
    pub parts: Vec<Part>,
}

/// Input of `list_multipart_uploads`.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ListMultipartUploadsInput {
    /// Bucket name.
    #[builder(setter(into))]
    pub bucket: String,
    /// Only uploads whose key starts with this prefix.
    #[builder(default, setter(into, strip_option))]
    pub prefix: Option<String>,
}

/// An upload entry in [`ListMultipartUploadsOutput`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UploadEntry {
    /// Object key.
    pub key: String,
    /// Upload id.
    pub upload_id: String,
    /// Initiation time.
    pub initiated: DateTime<Utc>,
}

/// Output of `list_multipart_uploads`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListMultipartUploadsOutput {
    /// Bucket name.
    pub bucket: String,
    /// Requested prefix.
    pub prefix: String,
    /// In-progress uploads sorted by key then initiation time.
    #[serde(rename = "Upload", skip_serializing_if = "Vec::is_empty")]
    pub uploads: Vec<UploadEntry>,
}

//! MD5-based ETag computation.
//!
//! Single-part objects use the quoted hex MD5 of their bytes. Objects produced
//! by a multipart upload use the MD5 of the concatenated raw part digests,
//! suffixed with the number of parts.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use digest::Digest;

/// Raw 16-byte MD5 digest.
pub type Md5Digest = [u8; 16];

/// Compute the raw MD5 digest of `data`.
#[must_use]
pub fn md5_digest(data: &[u8]) -> Md5Digest {
    let hash = md5::Md5::digest(data);
    let mut out = [0u8; 16];
    out.copy_from_slice(&hash);
    out
}

/// Compute the hex-encoded MD5 digest of `data`.
///
/// # Examples
///
/// ```
/// use s3lite_core::checksums::compute_md5;
///
/// let digest = compute_md5(b"hello");
/// assert_eq!(digest, "5d41402abc4b2a76b9719d911017c592");
/// ```
#[must_use]
pub fn compute_md5(data: &[u8]) -> String {
    hex::encode(md5_digest(data))
}

/// Compute the quoted hex MD5 of `data`, suitable for use as an S3 ETag.
///
/// # Examples
///
/// ```
/// use s3lite_core::checksums::compute_etag;
///
/// let etag = compute_etag(b"");
/// assert_eq!(etag, "\"d41d8cd98f00b204e9800998ecf8427e\"");
/// ```
#[must_use]
pub fn compute_etag(data: &[u8]) -> String {
    etag_from_digest(&md5_digest(data))
}

/// Format a raw digest as a quoted ETag.
#[must_use]
pub fn etag_from_digest(digest: &Md5Digest) -> String {
    format!("\"{}\"", hex::encode(digest))
}

/// Compute the composite ETag of a multipart object.
///
/// `part_digests` must be given in ascending part-number order. The result is
/// `"<hex(md5(d1 || d2 || ...))>-<count>"`, quoted.
///
/// # Examples
///
/// ```
/// use s3lite_core::checksums::{compute_multipart_etag, md5_digest};
///
/// let etag = compute_multipart_etag(&[md5_digest(b"hello"), md5_digest(b"world")]);
/// assert_eq!(etag, "\"065947336a2f2a95ba8899f3675c3be6-2\"");
/// ```
#[must_use]
pub fn compute_multipart_etag(part_digests: &[Md5Digest]) -> String {
    let mut hasher = <md5::Md5 as Digest>::new();
    for d in part_digests {
        Digest::update(&mut hasher, d);
    }
    let final_md5 = hex::encode(Digest::finalize(hasher));
    format!("\"{final_md5}-{}\"", part_digests.len())
}

/// Decode a base64 `Content-MD5` header value into a raw digest.
///
/// Returns `None` when the value is not valid base64 or not 16 bytes long.
#[must_use]
pub fn decode_content_md5(value: &str) -> Option<Md5Digest> {
    let bytes = BASE64_STANDARD.decode(value.trim()).ok()?;
    <Md5Digest>::try_from(bytes.as_slice()).ok()
}

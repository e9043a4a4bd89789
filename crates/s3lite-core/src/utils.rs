//! Utility helpers for the S3 engine.
//!
//! Identifier generation, HTTP range parsing, continuation-token encoding,
//! ETag normalization and listing key encoding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::S3ServiceError;

/// Characters escaped when a listing is requested with `EncodingType=url`.
///
/// Unreserved characters and `/` are kept verbatim.
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Generate a unique multipart upload ID.
///
/// Produces a 64-character lowercase hex string.
///
/// # Examples
///
/// ```
/// use s3lite_core::utils::generate_upload_id;
///
/// let id = generate_upload_id();
/// assert_eq!(id.len(), 64);
/// assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
/// ```
#[must_use]
pub fn generate_upload_id() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

/// A byte range requested by a reader.
///
/// Bounds are inclusive, matching the HTTP `Range` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// `bytes=start-end`.
    Inclusive {
        /// First byte offset.
        start: u64,
        /// Last byte offset (clamped to the object size).
        end: u64,
    },
    /// `bytes=start-`, from `start` to the end of the object.
    From(u64),
    /// `bytes=-n`, the last `n` bytes.
    Suffix(u64),
}

impl ByteRange {
    /// Parse an HTTP `Range` header value (`bytes=...`).
    ///
    /// # Examples
    ///
    /// ```
    /// use s3lite_core::utils::ByteRange;
    ///
    /// let range = ByteRange::parse("bytes=2-4").unwrap();
    /// assert_eq!(range.resolve(10).unwrap(), (2, 4));
    /// assert_eq!(ByteRange::parse("bytes=-3").unwrap().resolve(10).unwrap(), (7, 9));
    /// ```
    pub fn parse(header: &str) -> Result<Self, S3ServiceError> {
        let range_set = header
            .trim()
            .strip_prefix("bytes=")
            .ok_or(S3ServiceError::InvalidRange)?;
        let (start, end) = range_set.split_once('-').ok_or(S3ServiceError::InvalidRange)?;
        let num = |s: &str| s.trim().parse::<u64>().map_err(|_| S3ServiceError::InvalidRange);

        match (start.trim().is_empty(), end.trim().is_empty()) {
            (true, true) => Err(S3ServiceError::InvalidRange),
            (true, false) => Ok(Self::Suffix(num(end)?)),
            (false, true) => Ok(Self::From(num(start)?)),
            (false, false) => Ok(Self::Inclusive {
                start: num(start)?,
                end: num(end)?,
            }),
        }
    }

    /// Resolve the range against an object of `size` bytes, returning
    /// inclusive `(start, end)` offsets.
    ///
    /// The end is clamped to the last byte; a start at or beyond `size` is
    /// [`S3ServiceError::InvalidRange`].
    pub fn resolve(self, size: u64) -> Result<(u64, u64), S3ServiceError> {
        if size == 0 {
            return Err(S3ServiceError::InvalidRange);
        }
        let last = size - 1;
        match self {
            Self::Inclusive { start, end } => {
                if start > end || start >= size {
                    return Err(S3ServiceError::InvalidRange);
                }
                Ok((start, end.min(last)))
            }
            Self::From(start) => {
                if start >= size {
                    return Err(S3ServiceError::InvalidRange);
                }
                Ok((start, last))
            }
            Self::Suffix(0) => Err(S3ServiceError::InvalidRange),
            Self::Suffix(n) => Ok((size.saturating_sub(n), last)),
        }
    }
}

/// Strip surrounding double quotes from an ETag.
///
/// # Examples
///
/// ```
/// use s3lite_core::utils::normalize_etag;
///
/// assert_eq!(normalize_etag("\"abc\""), "abc");
/// assert_eq!(normalize_etag("abc"), "abc");
/// ```
#[must_use]
pub fn normalize_etag(etag: &str) -> &str {
    let etag = etag.trim();
    etag.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(etag)
}

/// Encode a listing cursor as an opaque continuation token.
///
/// # Examples
///
/// ```
/// use s3lite_core::utils::{decode_continuation_token, encode_continuation_token};
///
/// let token = encode_continuation_token("photos/2024/");
/// assert_eq!(decode_continuation_token(&token).unwrap(), "photos/2024/");
/// ```
#[must_use]
pub fn encode_continuation_token(key: &str) -> String {
    BASE64_STANDARD.encode(key.as_bytes())
}

/// Decode a continuation token back into the listing cursor.
pub fn decode_continuation_token(token: &str) -> Result<String, S3ServiceError> {
    let bytes = BASE64_STANDARD
        .decode(token)
        .map_err(|_| S3ServiceError::InvalidArgument {
            message: "The continuation token provided is incorrect".to_owned(),
        })?;
    String::from_utf8(bytes).map_err(|_| S3ServiceError::InvalidArgument {
        message: "Continuation token contains invalid UTF-8".to_owned(),
    })
}

/// Percent-encode a key (or prefix) for `EncodingType=url` listings.
///
/// # Examples
///
/// ```
/// use s3lite_core::utils::url_encode_key;
///
/// assert_eq!(url_encode_key("dir/a b+c.txt"), "dir/a%20b%2Bc.txt");
/// ```
#[must_use]
pub fn url_encode_key(key: &str) -> String {
    utf8_percent_encode(key, KEY_ENCODE_SET).to_string()
}

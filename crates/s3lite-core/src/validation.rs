//! Request validation.
//!
//! Bucket names follow the
//! [Amazon S3 naming rules](https://docs.aws.amazon.com/AmazonS3/latest/userguide/bucketnamingrules.html);
//! object keys and part numbers follow the S3 API limits.

use std::net::Ipv4Addr;

use crate::error::S3ServiceError;

/// Maximum object key length in bytes.
const MAX_KEY_BYTES: usize = 1024;

/// Minimum bucket name length.
const MIN_BUCKET_NAME_LEN: usize = 3;

/// Maximum bucket name length.
const MAX_BUCKET_NAME_LEN: usize = 63;

fn invalid_bucket(name: &str, reason: impl Into<String>) -> S3ServiceError {
    S3ServiceError::InvalidBucketName {
        name: name.to_owned(),
        reason: reason.into(),
    }
}

fn is_lower_alnum(b: u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_digit()
}

/// Validate an S3 bucket name.
///
/// Rules:
/// - 3-63 characters long
/// - Only lowercase letters, numbers, hyphens, and dots
/// - Must start and end with a letter or number
/// - No consecutive dots (`..`)
/// - Not formatted as an IPv4 address (e.g. `192.168.0.1`)
/// - Must not start with `xn--` nor end with `-s3alias`
///
/// # Examples
///
/// ```
/// use s3lite_core::validation::validate_bucket_name;
///
/// assert!(validate_bucket_name("my-valid-bucket").is_ok());
/// assert!(validate_bucket_name("AB").is_err());
/// ```
pub fn validate_bucket_name(name: &str) -> Result<(), S3ServiceError> {
    let bytes = name.as_bytes();

    if !(MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&bytes.len()) {
        return Err(invalid_bucket(
            name,
            format!(
                "Bucket name must be between {MIN_BUCKET_NAME_LEN} and {MAX_BUCKET_NAME_LEN} characters long"
            ),
        ));
    }
    if !bytes
        .iter()
        .all(|&b| is_lower_alnum(b) || b == b'-' || b == b'.')
    {
        return Err(invalid_bucket(
            name,
            "Bucket name must only contain lowercase letters, numbers, hyphens, and dots",
        ));
    }
    let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
    if !is_lower_alnum(first) || !is_lower_alnum(last) {
        return Err(invalid_bucket(
            name,
            "Bucket name must start and end with a letter or number",
        ));
    }
    if name.contains("..") {
        return Err(invalid_bucket(
            name,
            "Bucket name must not contain consecutive dots",
        ));
    }
    if name.parse::<Ipv4Addr>().is_ok() {
        return Err(invalid_bucket(
            name,
            "Bucket name must not be formatted as an IP address",
        ));
    }
    if name.starts_with("xn--") || name.ends_with("-s3alias") {
        return Err(invalid_bucket(name, "Bucket name uses a reserved prefix or suffix"));
    }

    Ok(())
}

/// Validate an S3 object key.
///
/// Keys must be 1-1024 bytes of UTF-8 (enforced by the `&str` type).
///
/// # Examples
///
/// ```
/// use s3lite_core::validation::validate_object_key;
///
/// assert!(validate_object_key("photos/2024/image.jpg").is_ok());
/// assert!(validate_object_key("").is_err());
/// ```
pub fn validate_object_key(key: &str) -> Result<(), S3ServiceError> {
    if key.is_empty() {
        return Err(S3ServiceError::InvalidArgument {
            message: "Object key must not be empty".to_owned(),
        });
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(S3ServiceError::KeyTooLong);
    }
    Ok(())
}

/// Validate a multipart part number against `1..=max`.
pub fn validate_part_number(part_number: u32, max: u32) -> Result<(), S3ServiceError> {
    if part_number == 0 || part_number > max {
        return Err(S3ServiceError::InvalidArgument {
            message: format!("Part number must be an integer between 1 and {max}, inclusive"),
        });
    }
    Ok(())
}

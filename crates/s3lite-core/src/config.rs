//! Engine configuration.
//!
//! Provides [`S3Config`] for tuning the storage engine. Values can be built
//! programmatically through the typed builder or loaded from environment
//! variables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Default in-memory threshold for object content, in bytes.
pub const DEFAULT_MAX_MEMORY_OBJECT_SIZE: usize = 524_288;

/// Default (and maximum) page size for listings.
pub const DEFAULT_MAX_KEYS: usize = 1000;

/// Highest part number accepted by a multipart upload.
pub const DEFAULT_MAX_PART_NUMBER: u32 = 10_000;

/// S3 engine configuration.
///
/// # Examples
///
/// ```
/// use s3lite_core::config::S3Config;
///
/// let config = S3Config::default();
/// assert_eq!(config.max_memory_object_size, 524_288);
/// assert_eq!(config.default_max_keys, 1000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct S3Config {
    /// Maximum content size (in bytes) kept in memory before spilling to disk.
    #[builder(default = DEFAULT_MAX_MEMORY_OBJECT_SIZE)]
    pub max_memory_object_size: usize,

    /// Directory for spill files. `None` uses the system temp directory.
    #[builder(default, setter(strip_option))]
    pub spill_dir: Option<PathBuf>,

    /// Page size used when a listing does not specify `MaxKeys`. Larger
    /// requested values are capped to it.
    #[builder(default = DEFAULT_MAX_KEYS)]
    pub default_max_keys: usize,

    /// Highest accepted multipart part number.
    #[builder(default = DEFAULT_MAX_PART_NUMBER)]
    pub max_part_number: u32,

    /// Whether bucket names must follow the S3 naming rules.
    #[builder(default = true)]
    pub strict_bucket_names: bool,

    /// Region reported for buckets.
    #[builder(default = String::from("us-east-1"))]
    pub default_region: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`) for hosts that
    /// install a subscriber.
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for S3Config {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl S3Config {
    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables (falling back to defaults
    /// when absent or malformed):
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `S3_MAX_MEMORY_OBJECT_SIZE` | `524288` |
    /// | `S3_SPILL_DIR` | system temp dir |
    /// | `S3_DEFAULT_MAX_KEYS` | `1000` |
    /// | `S3_STRICT_BUCKET_NAMES` | `true` |
    /// | `DEFAULT_REGION` | `us-east-1` |
    /// | `LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("S3_MAX_MEMORY_OBJECT_SIZE") {
            if let Ok(n) = v.parse::<usize>() {
                config.max_memory_object_size = n;
            }
        }
        if let Ok(v) = std::env::var("S3_SPILL_DIR") {
            if !v.is_empty() {
                config.spill_dir = Some(PathBuf::from(v));
            }
        }
        if let Ok(v) = std::env::var("S3_DEFAULT_MAX_KEYS") {
            if let Ok(n) = v.parse::<usize>() {
                config.default_max_keys = n;
            }
        }
        if let Ok(v) = std::env::var("S3_STRICT_BUCKET_NAMES") {
            config.strict_bucket_names = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("DEFAULT_REGION") {
            config.default_region = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

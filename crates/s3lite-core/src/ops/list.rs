//! List operation handlers.
//!
//! Implements `list_objects` (v1) and `list_objects_v2` on top of
//! [`crate::state::ObjectIndex::list`].

use tracing::debug;

use crate::error::S3Result;
use crate::model::{
    CommonPrefix, EncodingType, ListObjectsInput, ListObjectsOutput, ListObjectsV2Input,
    ListObjectsV2Output, Object,
};
use crate::provider::S3Lite;
use crate::state::ListResult;
use crate::utils::{decode_continuation_token, encode_continuation_token, url_encode_key};

/// Applies the requested encoding type to strings echoed in a listing.
#[derive(Debug, Clone, Copy)]
struct KeyEncoder(Option<EncodingType>);

impl KeyEncoder {
    fn encode(self, value: &str) -> String {
        match self.0 {
            Some(EncodingType::Url) => url_encode_key(value),
            Some(EncodingType::Path) | None => value.to_owned(),
        }
    }

    fn encode_opt(self, value: Option<&str>) -> Option<String> {
        value.map(|v| self.encode(v))
    }

    fn entries(self, result: &ListResult) -> (Vec<Object>, Vec<CommonPrefix>) {
        let contents = result
            .objects
            .iter()
            .map(|obj| Object {
                key: self.encode(&obj.key),
                last_modified: obj.last_modified,
                e_tag: obj.etag.clone(),
                size: obj.size,
            })
            .collect();
        let common_prefixes = result
            .common_prefixes
            .iter()
            .map(|p| CommonPrefix {
                prefix: self.encode(p),
            })
            .collect();
        (contents, common_prefixes)
    }
}

// Handlers stay async so the whole API is awaited uniformly.
#[allow(clippy::unused_async)]
impl S3Lite {
    /// Effective page size: the configured default when absent, capped at it.
    fn effective_max_keys(&self, requested: Option<usize>) -> usize {
        let cap = self.config.default_max_keys;
        requested.map_or(cap, |n| n.min(cap))
    }

    /// List objects (v1 API).
    pub async fn list_objects(&self, input: ListObjectsInput) -> S3Result<ListObjectsOutput> {
        let bucket = self.state.get_bucket(&input.bucket)?;
        let prefix = input.prefix.as_deref().unwrap_or("");
        let max_keys = self.effective_max_keys(input.max_keys);

        let result = bucket.list_objects(
            prefix,
            input.delimiter.as_deref(),
            input.marker.as_deref(),
            max_keys,
        )?;

        let encoder = KeyEncoder(input.encoding_type);
        let (contents, common_prefixes) = encoder.entries(&result);
        let next_marker = if result.is_truncated && input.delimiter.is_some() {
            encoder.encode_opt(result.next_marker.as_deref())
        } else {
            None
        };

        debug!(
            bucket = %input.bucket,
            prefix = %prefix,
            count = result.entry_count(),
            is_truncated = result.is_truncated,
            "list_objects completed"
        );

        Ok(ListObjectsOutput {
            prefix: encoder.encode(prefix),
            marker: encoder.encode(input.marker.as_deref().unwrap_or("")),
            next_marker,
            delimiter: encoder.encode_opt(input.delimiter.as_deref()),
            max_keys,
            is_truncated: result.is_truncated,
            contents,
            common_prefixes,
            encoding_type: input.encoding_type,
            name: input.bucket,
        })
    }

    /// List objects (v2 API with continuation tokens).
    pub async fn list_objects_v2(
        &self,
        input: ListObjectsV2Input,
    ) -> S3Result<ListObjectsV2Output> {
        let bucket = self.state.get_bucket(&input.bucket)?;
        let prefix = input.prefix.as_deref().unwrap_or("");
        let max_keys = self.effective_max_keys(input.max_keys);

        let decoded_token = input
            .continuation_token
            .as_deref()
            .map(decode_continuation_token)
            .transpose()?;
        let start_after = decoded_token.as_deref().or(input.start_after.as_deref());

        let result =
            bucket.list_objects(prefix, input.delimiter.as_deref(), start_after, max_keys)?;

        let encoder = KeyEncoder(input.encoding_type);
        let (contents, common_prefixes) = encoder.entries(&result);
        let next_continuation_token = if result.is_truncated {
            result.next_marker.as_deref().map(encode_continuation_token)
        } else {
            None
        };
        let key_count = result.entry_count();

        debug!(
            bucket = %input.bucket,
            prefix = %prefix,
            count = key_count,
            is_truncated = result.is_truncated,
            "list_objects_v2 completed"
        );

        Ok(ListObjectsV2Output {
            prefix: encoder.encode(prefix),
            delimiter: encoder.encode_opt(input.delimiter.as_deref()),
            max_keys,
            key_count,
            is_truncated: result.is_truncated,
            contents,
            common_prefixes,
            continuation_token: input.continuation_token,
            next_continuation_token,
            start_after: encoder.encode_opt(input.start_after.as_deref()),
            encoding_type: input.encoding_type,
            name: input.bucket,
        })
    }
}

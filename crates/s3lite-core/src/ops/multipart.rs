//! Multipart upload operation handlers.
//!
//! Implements `create_multipart_upload`, `upload_part`,
//! `complete_multipart_upload`, `abort_multipart_upload`, `list_parts` and
//! `list_multipart_uploads`. State transitions live in
//! [`crate::state::MultipartCoordinator`]; these handlers translate requests
//! and check the target bucket.

use tracing::debug;

use crate::error::S3Result;
use crate::model::{
    AbortMultipartUploadInput, CompleteMultipartUploadInput, CompleteMultipartUploadOutput,
    CreateMultipartUploadInput, CreateMultipartUploadOutput, ListMultipartUploadsInput,
    ListMultipartUploadsOutput, ListPartsInput, ListPartsOutput, Part, UploadEntry,
    UploadPartInput, UploadPartOutput,
};
use crate::provider::S3Lite;
use crate::state::{DEFAULT_CONTENT_TYPE, PartRef};
use crate::validation::validate_object_key;

/// Page size of `list_parts` when the caller does not ask for one.
const DEFAULT_MAX_PARTS: usize = 1000;

// Handlers stay async so the whole API is awaited uniformly.
#[allow(clippy::unused_async)]
impl S3Lite {
    /// Start a multipart upload.
    pub async fn create_multipart_upload(
        &self,
        input: CreateMultipartUploadInput,
    ) -> S3Result<CreateMultipartUploadOutput> {
        validate_object_key(&input.key)?;
        let bucket = self.state.get_bucket(&input.bucket)?;
        let content_type = input
            .content_type
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_owned());
        let upload = self.multipart.initiate(&bucket, &input.key, content_type)?;

        Ok(CreateMultipartUploadOutput {
            bucket: input.bucket,
            key: input.key,
            upload_id: upload.upload_id.clone(),
        })
    }

    /// Upload one part of a multipart upload.
    pub async fn upload_part(&self, input: UploadPartInput) -> S3Result<UploadPartOutput> {
        self.state.get_bucket(&input.bucket)?;
        let part = self
            .multipart
            .upload_part(
                &input.bucket,
                &input.key,
                &input.upload_id,
                input.part_number,
                input.body,
            )
            .await?;
        Ok(UploadPartOutput { e_tag: part.etag })
    }

    /// Assemble the listed parts into the final object.
    pub async fn complete_multipart_upload(
        &self,
        input: CompleteMultipartUploadInput,
    ) -> S3Result<CompleteMultipartUploadOutput> {
        let bucket = self.state.get_bucket(&input.bucket)?;
        let parts: Vec<PartRef> = input
            .parts
            .into_iter()
            .map(|p| PartRef {
                part_number: p.part_number,
                etag: p.e_tag,
            })
            .collect();

        let object = self
            .multipart
            .complete(&bucket, &input.key, &input.upload_id, &parts)
            .await?;

        Ok(CompleteMultipartUploadOutput {
            location: format!("/{}/{}", input.bucket, input.key),
            bucket: input.bucket,
            key: input.key,
            e_tag: object.etag,
            size: object.size,
        })
    }

    /// Abort a multipart upload and release its parts.
    pub async fn abort_multipart_upload(&self, input: AbortMultipartUploadInput) -> S3Result<()> {
        self.state.get_bucket(&input.bucket)?;
        self.multipart
            .abort(&input.bucket, &input.key, &input.upload_id)?;
        Ok(())
    }

    /// List the parts of an upload, sorted by part number.
    pub async fn list_parts(&self, input: ListPartsInput) -> S3Result<ListPartsOutput> {
        self.state.get_bucket(&input.bucket)?;
        let upload = self
            .multipart
            .get(&input.bucket, &input.key, &input.upload_id)?;

        let marker = input.part_number_marker.unwrap_or(0);
        let max_parts = input.max_parts.unwrap_or(DEFAULT_MAX_PARTS);
        let mut remaining = upload
            .sorted_parts()
            .into_iter()
            .filter(|p| p.part_number > marker)
            .peekable();

        let parts: Vec<Part> = remaining
            .by_ref()
            .take(max_parts)
            .map(|p| Part {
                part_number: p.part_number,
                e_tag: p.etag,
                size: p.size,
                last_modified: p.last_modified,
            })
            .collect();
        let is_truncated = max_parts > 0 && remaining.peek().is_some();
        let next_part_number_marker = if is_truncated {
            parts.last().map(|p| p.part_number)
        } else {
            None
        };

        debug!(
            upload_id = %input.upload_id,
            count = parts.len(),
            is_truncated,
            "list_parts completed"
        );

        Ok(ListPartsOutput {
            bucket: input.bucket,
            key: input.key,
            upload_id: input.upload_id,
            part_number_marker: marker,
            next_part_number_marker,
            max_parts,
            is_truncated,
            parts,
        })
    }

    /// List the in-progress uploads of a bucket.
    pub async fn list_multipart_uploads(
        &self,
        input: ListMultipartUploadsInput,
    ) -> S3Result<ListMultipartUploadsOutput> {
        self.state.get_bucket(&input.bucket)?;
        let prefix = input.prefix.unwrap_or_default();
        let uploads = self
            .multipart
            .list_uploads(&input.bucket, &prefix)
            .into_iter()
            .map(|u| UploadEntry {
                key: u.key.clone(),
                upload_id: u.upload_id.clone(),
                initiated: u.initiated,
            })
            .collect();

        Ok(ListMultipartUploadsOutput {
            bucket: input.bucket,
            prefix,
            uploads,
        })
    }
}

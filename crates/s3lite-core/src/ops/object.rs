//! Object operation handlers.
//!
//! Implements `put_object`, `get_object`, `head_object`, `delete_object` and
//! `delete_objects`. Writers of a key serialize on the bucket's key lock;
//! content is stored before the index is updated, and displaced content is
//! released after.

use chrono::Utc;
use tracing::{debug, trace};

use crate::checksums::decode_content_md5;
use crate::error::{S3Error, S3Result, S3ServiceError, S3ServiceResult};
use crate::model::{
    DeleteError, DeleteObjectInput, DeleteObjectsInput, DeleteObjectsOutput, DeletedObject,
    GetObjectInput, GetObjectOutput, HeadObjectInput, HeadObjectOutput, PutObjectInput,
    PutObjectOutput,
};
use crate::provider::S3Lite;
use crate::state::{DEFAULT_CONTENT_TYPE, S3Bucket, S3Object};
use crate::validation::validate_object_key;

impl S3Lite {
    /// Store an object, replacing any object at the same key.
    pub async fn put_object(&self, input: PutObjectInput) -> S3Result<PutObjectOutput> {
        let PutObjectInput {
            bucket: bucket_name,
            key,
            body,
            content_type,
            content_md5,
        } = input;
        validate_object_key(&key)?;
        let expected_md5 = content_md5
            .map(|value| decode_content_md5(&value).ok_or(S3ServiceError::InvalidDigest))
            .transpose()?;

        let bucket = self.state.get_bucket(&bucket_name)?;
        let _guard = bucket.lock_key(&key).await;

        let receipt = self.storage.put(body).await?;
        if expected_md5.is_some_and(|md5| md5 != receipt.md5) {
            self.storage.delete(&receipt.handle);
            return Err(S3ServiceError::BadDigest.into());
        }

        let object = S3Object {
            key: key.clone(),
            handle: receipt.handle,
            size: receipt.size,
            etag: receipt.etag,
            last_modified: Utc::now(),
            content_type: content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_owned()),
            parts_count: None,
        };
        let output = PutObjectOutput {
            e_tag: object.etag.clone(),
            size: object.size,
        };

        match bucket.put_object(object) {
            Ok(previous) => {
                if let Some(previous) = previous {
                    self.storage.delete(&previous.handle);
                }
            }
            Err(e) => {
                self.storage.delete(&receipt.handle);
                return Err(e.into());
            }
        }

        debug!(
            bucket = %bucket_name,
            key = %key,
            size = output.size,
            etag = %output.e_tag,
            "put_object completed"
        );
        Ok(output)
    }

    /// Read an object, or a byte range of it.
    ///
    /// A concurrent overwrite may release the content between the index
    /// lookup and the read; the lookup is then repeated against the newer
    /// object. `NoSuchKey` is returned only once the index no longer holds
    /// the key.
    pub async fn get_object(&self, input: GetObjectInput) -> S3Result<GetObjectOutput> {
        let bucket = self.state.get_bucket(&input.bucket)?;
        let mut object = bucket.get_object(&input.key)?;

        let (body, resolved) = loop {
            let resolved = input.range.map(|r| r.resolve(object.size)).transpose()?;
            match self.storage.get(&object.handle, resolved).await {
                Ok(body) => break (body, resolved),
                Err(S3ServiceError::ContentNotFound { handle }) => {
                    let current = bucket.get_object(&input.key)?;
                    if current.handle == object.handle {
                        return Err(S3ServiceError::ContentNotFound { handle }.into());
                    }
                    trace!(
                        key = %input.key,
                        stale = %handle,
                        "content replaced during read, retrying"
                    );
                    object = current;
                }
                Err(e) => return Err(e.into()),
            }
        };
        let content_range =
            resolved.map(|(start, end)| format!("bytes {start}-{end}/{}", object.size));

        debug!(
            bucket = %input.bucket,
            key = %input.key,
            size = body.len(),
            ranged = content_range.is_some(),
            "get_object completed"
        );

        Ok(GetObjectOutput {
            content_length: body.len() as u64,
            body,
            content_range,
            content_type: object.content_type,
            e_tag: object.etag,
            last_modified: object.last_modified,
            parts_count: object.parts_count,
        })
    }

    /// Read an object's metadata.
    #[allow(clippy::unused_async)]
    pub async fn head_object(&self, input: HeadObjectInput) -> S3Result<HeadObjectOutput> {
        let bucket = self.state.get_bucket(&input.bucket)?;
        let object = bucket.get_object(&input.key)?;
        Ok(HeadObjectOutput {
            content_length: object.size,
            content_type: object.content_type,
            e_tag: object.etag,
            last_modified: object.last_modified,
            parts_count: object.parts_count,
        })
    }

    /// Delete an object. Deleting an absent key succeeds.
    pub async fn delete_object(&self, input: DeleteObjectInput) -> S3Result<()> {
        let bucket = self.state.get_bucket(&input.bucket)?;
        let existed = self.remove_object(&bucket, &input.key).await?;
        debug!(bucket = %input.bucket, key = %input.key, existed, "delete_object completed");
        Ok(())
    }

    /// Delete a batch of keys. Failures are reported per key.
    pub async fn delete_objects(&self, input: DeleteObjectsInput) -> S3Result<DeleteObjectsOutput> {
        let bucket = self.state.get_bucket(&input.bucket)?;
        let mut output = DeleteObjectsOutput::default();

        for key in input.keys {
            let result = match validate_object_key(&key) {
                Ok(()) => self.remove_object(&bucket, &key).await.map(|_| ()),
                Err(e) => Err(e),
            };
            match result {
                Ok(()) if input.quiet => {}
                Ok(()) => output.deleted.push(DeletedObject { key }),
                Err(e) => {
                    let err = S3Error::from(e);
                    output.errors.push(DeleteError {
                        key,
                        code: err.code.as_str().to_owned(),
                        message: err.message,
                    });
                }
            }
        }

        debug!(
            bucket = %input.bucket,
            deleted = output.deleted.len(),
            errors = output.errors.len(),
            "delete_objects completed"
        );
        Ok(output)
    }

    /// Remove `key` from `bucket` under its key lock and release its content.
    /// Returns whether an object was removed.
    pub(crate) async fn remove_object(
        &self,
        bucket: &S3Bucket,
        key: &str,
    ) -> S3ServiceResult<bool> {
        let _guard = bucket.lock_key(key).await;
        match bucket.delete_object(key)? {
            Some(object) => {
                self.storage.delete(&object.handle);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

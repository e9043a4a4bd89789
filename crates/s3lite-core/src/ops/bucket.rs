//! Bucket operation handlers.
//!
//! Implements `create_bucket`, `delete_bucket`, `head_bucket`, `list_buckets`
//! and `empty_bucket`.

use tracing::debug;

use crate::error::S3Result;
use crate::model::{
    Bucket, CreateBucketInput, CreateBucketOutput, HeadBucketOutput, ListBucketsOutput,
};
use crate::provider::S3Lite;
use crate::state::{FULL_LISTING_PAGE_SIZE, FullListing};
use crate::validation::validate_bucket_name;

// Handlers stay async so the whole API is awaited uniformly.
#[allow(clippy::unused_async)]
impl S3Lite {
    /// Create a new bucket.
    pub async fn create_bucket(&self, input: CreateBucketInput) -> S3Result<CreateBucketOutput> {
        let bucket_name = input.bucket;
        if self.config.strict_bucket_names {
            validate_bucket_name(&bucket_name)?;
        }
        let region = input
            .region
            .unwrap_or_else(|| self.config.default_region.clone());

        self.state.create_bucket(&bucket_name, &region)?;

        Ok(CreateBucketOutput {
            location: format!("/{bucket_name}"),
        })
    }

    /// Delete an empty bucket and abort its in-progress uploads.
    pub async fn delete_bucket(&self, bucket: &str) -> S3Result<()> {
        let deleted = self.state.delete_bucket(bucket)?;
        let aborted = self.multipart.abort_bucket(&deleted);
        debug!(bucket = %bucket, aborted_uploads = aborted, "delete_bucket completed");
        Ok(())
    }

    /// Check that a bucket exists.
    pub async fn head_bucket(&self, bucket: &str) -> S3Result<HeadBucketOutput> {
        let bucket = self.state.get_bucket(bucket)?;
        Ok(HeadBucketOutput {
            bucket_region: bucket.region.clone(),
        })
    }

    /// List all buckets sorted by name.
    pub async fn list_buckets(&self) -> S3Result<ListBucketsOutput> {
        let buckets = self
            .state
            .list_buckets()
            .into_iter()
            .map(|summary| Bucket {
                name: summary.name,
                creation_date: summary.creation_date,
            })
            .collect();
        Ok(ListBucketsOutput { buckets })
    }

    /// Delete every object of a bucket and abort its in-progress uploads.
    /// Returns the number of objects deleted.
    pub async fn empty_bucket(&self, bucket_name: &str) -> S3Result<usize> {
        let bucket = self.state.get_bucket(bucket_name)?;
        let mut listing = FullListing::new("", FULL_LISTING_PAGE_SIZE);
        let mut deleted = 0;

        while let Some(page) = bucket.next_page(&mut listing) {
            for object in page {
                if self.remove_object(&bucket, &object.key).await? {
                    deleted += 1;
                }
            }
        }
        let aborted = self.multipart.abort_bucket(&bucket);

        debug!(
            bucket = %bucket_name,
            deleted,
            aborted_uploads = aborted,
            "empty_bucket completed"
        );
        Ok(deleted)
    }
}

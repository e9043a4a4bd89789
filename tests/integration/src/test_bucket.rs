//! Bucket CRUD integration tests.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use s3lite_core::S3ErrorCode;
    use s3lite_core::model::{
        CreateBucketInput, DeleteObjectInput, ListObjectsV2Input, PutObjectInput,
    };

    use crate::{cleanup_bucket, create_test_bucket, service, test_bucket_name};

    #[tokio::test]
    async fn test_should_create_and_delete_bucket() {
        let s3 = service();
        let bucket = create_test_bucket(&s3, "create").await;

        let head = s3.head_bucket(&bucket).await;
        assert!(head.is_ok(), "head_bucket should succeed");

        cleanup_bucket(&s3, &bucket).await;

        let head = s3.head_bucket(&bucket).await;
        assert!(head.is_err(), "head_bucket should fail after delete");
    }

    #[tokio::test]
    async fn test_should_list_buckets() {
        let s3 = service();
        let b1 = create_test_bucket(&s3, "list1").await;
        let b2 = create_test_bucket(&s3, "list2").await;

        let resp = s3.list_buckets().await.expect("list_buckets");
        let names: Vec<&str> = resp.buckets.iter().map(|b| b.name.as_str()).collect();

        assert!(names.contains(&b1.as_str()), "should contain {b1}");
        assert!(names.contains(&b2.as_str()), "should contain {b2}");
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted, "buckets should be sorted by name");

        cleanup_bucket(&s3, &b1).await;
        cleanup_bucket(&s3, &b2).await;
    }

    #[tokio::test]
    async fn test_should_reject_duplicate_bucket() {
        let s3 = service();
        let bucket = create_test_bucket(&s3, "dup").await;

        let err = s3
            .create_bucket(CreateBucketInput::builder().bucket(bucket.clone()).build())
            .await
            .expect_err("duplicate create should fail");
        assert_eq!(err.code, S3ErrorCode::BucketAlreadyExists);
        assert_eq!(err.status_code.as_u16(), 409);

        cleanup_bucket(&s3, &bucket).await;
    }

    #[tokio::test]
    async fn test_should_reject_delete_of_non_empty_bucket() {
        let s3 = service();
        let bucket = create_test_bucket(&s3, "nonempty").await;

        s3.put_object(
            PutObjectInput::builder()
                .bucket(bucket.clone())
                .key("file.txt")
                .body(Bytes::from_static(b"content"))
                .build(),
        )
        .await
        .expect("put_object");

        let err = s3
            .delete_bucket(&bucket)
            .await
            .expect_err("delete of non-empty bucket should fail");
        assert_eq!(err.code, S3ErrorCode::BucketNotEmpty);
        assert!(
            err.message
                .contains("The bucket you tried to delete is not empty"),
            "unexpected message: {}",
            err.message
        );

        s3.delete_object(
            DeleteObjectInput::builder()
                .bucket(bucket.clone())
                .key("file.txt")
                .build(),
        )
        .await
        .expect("delete_object");
        s3.delete_bucket(&bucket)
            .await
            .expect("delete of empty bucket");
    }

    #[tokio::test]
    async fn test_should_report_missing_bucket() {
        let s3 = service();
        let name = test_bucket_name("missing");

        let err = s3.head_bucket(&name).await.expect_err("head should fail");
        assert_eq!(err.code, S3ErrorCode::NoSuchBucket);

        let err = s3
            .delete_bucket(&name)
            .await
            .expect_err("delete should fail");
        assert_eq!(err.code, S3ErrorCode::NoSuchBucket);
        assert_eq!(err.status_code.as_u16(), 404);
    }

    #[tokio::test]
    async fn test_should_recreate_bucket_after_delete() {
        let s3 = service();
        let bucket = create_test_bucket(&s3, "again").await;
        s3.delete_bucket(&bucket).await.expect("delete_bucket");

        s3.create_bucket(CreateBucketInput::builder().bucket(bucket.clone()).build())
            .await
            .expect("recreate");
        let list = s3
            .list_objects_v2(
                ListObjectsV2Input::builder()
                    .bucket(bucket.clone())
                    .build(),
            )
            .await
            .expect("list");
        assert_eq!(list.key_count, 0);

        cleanup_bucket(&s3, &bucket).await;
    }
}

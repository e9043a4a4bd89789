//! Object CRUD integration tests.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use proptest::prelude::*;
    use s3lite_core::model::{
        DeleteObjectInput, DeleteObjectsInput, GetObjectInput, HeadObjectInput,
        ListObjectsV2Input, PutObjectInput,
    };
    use s3lite_core::utils::ByteRange;
    use s3lite_core::{S3Config, S3ErrorCode, S3Lite};

    use crate::{TEST_MEMORY_THRESHOLD, cleanup_bucket, create_test_bucket, service};

    async fn put(s3: &S3Lite, bucket: &str, key: &str, body: impl Into<Bytes>) -> String {
        s3.put_object(
            PutObjectInput::builder()
                .bucket(bucket)
                .key(key)
                .body(body.into())
                .build(),
        )
        .await
        .expect("put_object")
        .e_tag
    }

    #[tokio::test]
    async fn test_should_put_and_get_object() {
        let s3 = service();
        let bucket = create_test_bucket(&s3, "putget").await;

        let body = b"hello, s3lite!";
        s3.put_object(
            PutObjectInput::builder()
                .bucket(bucket.clone())
                .key("greeting.txt")
                .body(Bytes::from_static(body))
                .content_type("text/plain")
                .build(),
        )
        .await
        .expect("put_object");

        let resp = s3
            .get_object(
                GetObjectInput::builder()
                    .bucket(bucket.clone())
                    .key("greeting.txt")
                    .build(),
            )
            .await
            .expect("get_object");

        assert_eq!(resp.content_type, "text/plain", "content_type should match");
        assert_eq!(resp.content_length, 14);
        assert_eq!(resp.body.as_ref(), body);

        cleanup_bucket(&s3, &bucket).await;
    }

    #[tokio::test]
    async fn test_should_return_md5_etag_for_known_content() {
        let s3 = service();
        let bucket = create_test_bucket(&s3, "etag").await;

        let etag = put(&s3, &bucket, "file-0.txt", Bytes::from_static(b"TEST")).await;
        assert_eq!(etag, "\"033bd94b1168d7e4f0d644c3c95e35bf\"");

        let resp = s3
            .get_object(
                GetObjectInput::builder()
                    .bucket(bucket.clone())
                    .key("file-0.txt")
                    .build(),
            )
            .await
            .expect("get_object");
        assert_eq!(resp.content_length, 4);
        assert_eq!(resp.e_tag, etag);

        cleanup_bucket(&s3, &bucket).await;
    }

    #[tokio::test]
    async fn test_should_head_object() {
        let s3 = service();
        let bucket = create_test_bucket(&s3, "head").await;
        let etag = put(&s3, &bucket, "meta.bin", vec![7u8; 42]).await;

        let head = s3
            .head_object(
                HeadObjectInput::builder()
                    .bucket(bucket.clone())
                    .key("meta.bin")
                    .build(),
            )
            .await
            .expect("head_object");
        assert_eq!(head.content_length, 42);
        assert_eq!(head.e_tag, etag);
        assert_eq!(head.content_type, "binary/octet-stream");
        assert!(head.parts_count.is_none());

        cleanup_bucket(&s3, &bucket).await;
    }

    #[tokio::test]
    async fn test_should_get_range_of_object() {
        let s3 = service();
        let bucket = create_test_bucket(&s3, "range").await;
        let etag = put(&s3, &bucket, "digits", Bytes::from_static(b"0123456789")).await;

        let range = ByteRange::parse("bytes=2-4").expect("parse range");
        let resp = s3
            .get_object(
                GetObjectInput::builder()
                    .bucket(bucket.clone())
                    .key("digits")
                    .range(range)
                    .build(),
            )
            .await
            .expect("ranged get");
        assert_eq!(resp.body.as_ref(), b"234");
        assert_eq!(resp.content_length, 3);
        assert_eq!(resp.content_range.as_deref(), Some("bytes 2-4/10"));
        assert_eq!(resp.e_tag, etag, "etag reflects the whole object");

        let suffix = s3
            .get_object(
                GetObjectInput::builder()
                    .bucket(bucket.clone())
                    .key("digits")
                    .range(ByteRange::Suffix(3))
                    .build(),
            )
            .await
            .expect("suffix get");
        assert_eq!(suffix.body.as_ref(), b"789");

        cleanup_bucket(&s3, &bucket).await;
    }

    #[tokio::test]
    async fn test_should_read_large_object_ranges_from_spill_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let s3 = S3Lite::new(
            S3Config::builder()
                .max_memory_object_size(TEST_MEMORY_THRESHOLD)
                .spill_dir(dir.path().to_path_buf())
                .build(),
        );
        let bucket = create_test_bucket(&s3, "spill").await;

        let body: Vec<u8> = (0..TEST_MEMORY_THRESHOLD * 4)
            .map(|i| u8::try_from(i % 251).unwrap_or(0))
            .collect();
        put(&s3, &bucket, "large.bin", body.clone()).await;
        assert!(
            std::fs::read_dir(dir.path()).expect("read_dir").count() >= 1,
            "large body should spill to disk"
        );

        let resp = s3
            .get_object(
                GetObjectInput::builder()
                    .bucket(bucket.clone())
                    .key("large.bin")
                    .range(ByteRange::Inclusive {
                        start: 5000,
                        end: 5099,
                    })
                    .build(),
            )
            .await
            .expect("ranged get");
        assert_eq!(resp.body.as_ref(), &body[5000..5100]);

        cleanup_bucket(&s3, &bucket).await;
        assert_eq!(
            std::fs::read_dir(dir.path()).expect("read_dir").count(),
            0,
            "spill files should be removed with their objects"
        );
    }

    #[tokio::test]
    async fn test_should_overwrite_object() {
        let s3 = service();
        let bucket = create_test_bucket(&s3, "overwrite").await;
        put(&s3, &bucket, "k", Bytes::from_static(b"old")).await;
        let etag = put(&s3, &bucket, "k", Bytes::from_static(b"new content")).await;

        let resp = s3
            .get_object(GetObjectInput::builder().bucket(bucket.clone()).key("k").build())
            .await
            .expect("get_object");
        assert_eq!(resp.body.as_ref(), b"new content");
        assert_eq!(resp.e_tag, etag);

        cleanup_bucket(&s3, &bucket).await;
    }

    #[tokio::test]
    async fn test_should_delete_object_idempotently() {
        let s3 = service();
        let bucket = create_test_bucket(&s3, "delete").await;
        put(&s3, &bucket, "gone", Bytes::from_static(b"x")).await;

        for _ in 0..2 {
            s3.delete_object(
                DeleteObjectInput::builder()
                    .bucket(bucket.clone())
                    .key("gone")
                    .build(),
            )
            .await
            .expect("delete_object");
        }

        let err = s3
            .get_object(GetObjectInput::builder().bucket(bucket.clone()).key("gone").build())
            .await
            .expect_err("get after delete");
        assert_eq!(err.code, S3ErrorCode::NoSuchKey);

        cleanup_bucket(&s3, &bucket).await;
    }

    #[tokio::test]
    async fn test_should_delete_ten_objects_in_batch() {
        let s3 = service();
        let bucket = create_test_bucket(&s3, "batch").await;
        let keys: Vec<String> = (0..10).map(|i| format!("f-{i}.txt")).collect();
        for key in &keys {
            put(&s3, &bucket, key, Bytes::from_static(b"payload")).await;
        }

        let list = s3
            .list_objects_v2(ListObjectsV2Input::builder().bucket(bucket.clone()).build())
            .await
            .expect("list");
        assert_eq!(list.key_count, 10);

        let resp = s3
            .delete_objects(
                DeleteObjectsInput::builder()
                    .bucket(bucket.clone())
                    .keys(keys.clone())
                    .build(),
            )
            .await
            .expect("delete_objects");
        assert_eq!(resp.deleted.len(), 10);
        assert!(resp.errors.is_empty());

        let list = s3
            .list_objects_v2(ListObjectsV2Input::builder().bucket(bucket.clone()).build())
            .await
            .expect("list");
        assert_eq!(list.key_count, 0);

        cleanup_bucket(&s3, &bucket).await;
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn test_should_round_trip_arbitrary_payloads(
            body in proptest::collection::vec(any::<u8>(), 0..(TEST_MEMORY_THRESHOLD * 2)),
            start in 0usize..(TEST_MEMORY_THRESHOLD * 2),
            len in 1usize..512,
        ) {
            let rt = tokio::runtime::Runtime::new().expect("runtime");
            rt.block_on(async {
                let s3 = service();
                let bucket = create_test_bucket(&s3, "prop").await;
                let etag = put(&s3, &bucket, "blob", body.clone()).await;
                prop_assert_eq!(&etag, &format!("\"{}\"", s3lite_core::checksums::compute_md5(&body)));

                let resp = s3
                    .get_object(GetObjectInput::builder().bucket(bucket.clone()).key("blob").build())
                    .await
                    .expect("get_object");
                prop_assert_eq!(resp.body.as_ref(), &body[..]);

                if start < body.len() {
                    let end = (start + len - 1).min(body.len() - 1);
                    let resp = s3
                        .get_object(
                            GetObjectInput::builder()
                                .bucket(bucket.clone())
                                .key("blob")
                                .range(ByteRange::Inclusive { start: start as u64, end: end as u64 })
                                .build(),
                        )
                        .await
                        .expect("ranged get");
                    prop_assert_eq!(resp.body.as_ref(), &body[start..=end]);
                    prop_assert_eq!(resp.content_length, (end - start + 1) as u64);
                }

                cleanup_bucket(&s3, &bucket).await;
                Ok(())
            })?;
        }
    }
}

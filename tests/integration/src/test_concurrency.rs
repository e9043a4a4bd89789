//! Concurrency integration tests.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use bytes::Bytes;
    use futures::future::join_all;
    use s3lite_core::S3ErrorCode;
    use s3lite_core::checksums::compute_md5;
    use s3lite_core::model::{
        CreateBucketInput, CreateMultipartUploadInput, DeleteObjectInput, GetObjectInput,
        ListMultipartUploadsInput, ListObjectsV2Input, PutObjectInput,
    };

    use crate::{cleanup_bucket, create_test_bucket, service, test_bucket_name};

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_should_store_hundred_concurrent_puts() {
        let s3 = Arc::new(service());
        let bucket = create_test_bucket(&s3, "parallel").await;

        let tasks = (0..100).map(|i| {
            let s3 = Arc::clone(&s3);
            let bucket = bucket.clone();
            tokio::spawn(async move {
                let body = format!("payload number {i}");
                let out = s3
                    .put_object(
                        PutObjectInput::builder()
                            .bucket(bucket)
                            .key(format!("obj-{i:03}"))
                            .body(Bytes::from(body.clone()))
                            .build(),
                    )
                    .await
                    .expect("put_object");
                (out.e_tag, compute_md5(body.as_bytes()))
            })
        });

        for result in join_all(tasks).await {
            let (etag, md5) = result.expect("task panicked");
            assert_eq!(etag, format!("\"{md5}\""));
        }

        let list = s3
            .list_objects_v2(
                ListObjectsV2Input::builder()
                    .bucket(bucket.clone())
                    .build(),
            )
            .await
            .expect("list_objects_v2");
        assert_eq!(list.key_count, 100);
        assert_eq!(list.contents.len(), 100);

        cleanup_bucket(&s3, &bucket).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_should_keep_one_complete_body_under_same_key_writes() {
        let s3 = Arc::new(service());
        let bucket = create_test_bucket(&s3, "samekey").await;

        let bodies: Vec<Bytes> = (0u8..16).map(|i| Bytes::from(vec![i; 2048])).collect();
        let tasks = bodies.iter().cloned().map(|body| {
            let s3 = Arc::clone(&s3);
            let bucket = bucket.clone();
            tokio::spawn(async move {
                s3.put_object(
                    PutObjectInput::builder()
                        .bucket(bucket)
                        .key("contended")
                        .body(body)
                        .build(),
                )
                .await
                .expect("put_object")
            })
        });
        for result in join_all(tasks).await {
            result.expect("task panicked");
        }

        let got = s3
            .get_object(
                GetObjectInput::builder()
                    .bucket(bucket.clone())
                    .key("contended")
                    .build(),
            )
            .await
            .expect("get_object");
        assert!(
            bodies.contains(&got.body),
            "body must be exactly one of the written versions"
        );
        assert_eq!(got.e_tag, format!("\"{}\"", compute_md5(&got.body)));
        assert_eq!(s3.storage().len(), 1, "displaced versions are released");

        cleanup_bucket(&s3, &bucket).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_should_never_lose_bucket_with_objects_during_delete_race() {
        let s3 = Arc::new(service());

        for round in 0..20 {
            let bucket = create_test_bucket(&s3, "race").await;

            let writer = {
                let s3 = Arc::clone(&s3);
                let bucket = bucket.clone();
                tokio::spawn(async move {
                    s3.put_object(
                        PutObjectInput::builder()
                            .bucket(bucket)
                            .key("late")
                            .body(Bytes::from_static(b"x"))
                            .build(),
                    )
                    .await
                })
            };
            let deleter = {
                let s3 = Arc::clone(&s3);
                let bucket = bucket.clone();
                tokio::spawn(async move { s3.delete_bucket(&bucket).await })
            };

            let put = writer.await.expect("writer panicked");
            let delete = deleter.await.expect("deleter panicked");

            match (put, delete) {
                (Ok(_), Err(e)) => {
                    assert_eq!(e.code, S3ErrorCode::BucketNotEmpty, "round {round}");
                    s3.delete_object(
                        DeleteObjectInput::builder()
                            .bucket(bucket.clone())
                            .key("late")
                            .build(),
                    )
                    .await
                    .expect("delete_object");
                    s3.delete_bucket(&bucket).await.expect("delete_bucket");
                }
                (Err(e), Ok(())) => {
                    assert_eq!(e.code, S3ErrorCode::NoSuchBucket, "round {round}");
                }
                (put, delete) => panic!(
                    "round {round}: exactly one side must win, got put={put:?} delete={delete:?}"
                ),
            }
            assert!(s3.storage().is_empty(), "round {round}: no orphaned content");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_should_keep_reading_key_while_it_is_overwritten() {
        let s3 = Arc::new(service());
        let bucket = create_test_bucket(&s3, "readwrite").await;
        let put = |body: Bytes| {
            PutObjectInput::builder()
                .bucket(bucket.clone())
                .key("k")
                .body(body)
                .build()
        };
        s3.put_object(put(Bytes::from_static(b"v0")))
            .await
            .expect("initial put");

        let done = Arc::new(AtomicBool::new(false));
        let writer = {
            let s3 = Arc::clone(&s3);
            let done = Arc::clone(&done);
            let inputs: Vec<PutObjectInput> = (0..2000)
                .map(|i| put(Bytes::from(format!("version {i}"))))
                .collect();
            tokio::spawn(async move {
                for input in inputs {
                    s3.put_object(input).await.expect("overwrite");
                }
                done.store(true, Ordering::Release);
            })
        };
        let reader = {
            let s3 = Arc::clone(&s3);
            let done = Arc::clone(&done);
            let bucket = bucket.clone();
            tokio::spawn(async move {
                let mut reads = 0u64;
                loop {
                    let finished = done.load(Ordering::Acquire);
                    let out = s3
                        .get_object(
                            GetObjectInput::builder()
                                .bucket(bucket.clone())
                                .key("k")
                                .build(),
                        )
                        .await
                        .unwrap_or_else(|e| panic!("read {reads} of an existing key failed: {e}"));
                    assert_eq!(out.e_tag, format!("\"{}\"", compute_md5(&out.body)));
                    reads += 1;
                    if finished {
                        break;
                    }
                    tokio::task::yield_now().await;
                }
                reads
            })
        };

        writer.await.expect("writer panicked");
        let reads = reader.await.expect("reader panicked");
        assert!(reads > 0);

        cleanup_bucket(&s3, &bucket).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_should_not_leak_uploads_into_recreated_bucket() {
        let s3 = Arc::new(service());
        let bucket = test_bucket_name("mpurace");

        for round in 0..200 {
            s3.create_bucket(CreateBucketInput::builder().bucket(bucket.clone()).build())
                .await
                .expect("create_bucket");

            let initiator = {
                let s3 = Arc::clone(&s3);
                let bucket = bucket.clone();
                tokio::spawn(async move {
                    s3.create_multipart_upload(
                        CreateMultipartUploadInput::builder()
                            .bucket(bucket)
                            .key("pending")
                            .build(),
                    )
                    .await
                })
            };
            let deleter = {
                let s3 = Arc::clone(&s3);
                let bucket = bucket.clone();
                tokio::spawn(async move { s3.delete_bucket(&bucket).await })
            };

            if let Err(e) = initiator.await.expect("initiator panicked") {
                assert_eq!(e.code, S3ErrorCode::NoSuchBucket, "round {round}");
            }
            deleter
                .await
                .expect("deleter panicked")
                .expect("an upload does not keep the bucket alive");
            assert!(s3.multipart().is_empty(), "round {round}: upload survived delete");
        }

        s3.create_bucket(CreateBucketInput::builder().bucket(bucket.clone()).build())
            .await
            .expect("recreate");
        let uploads = s3
            .list_multipart_uploads(
                ListMultipartUploadsInput::builder()
                    .bucket(bucket.clone())
                    .build(),
            )
            .await
            .expect("list_multipart_uploads");
        assert!(uploads.uploads.is_empty());

        cleanup_bucket(&s3, &bucket).await;
    }
}

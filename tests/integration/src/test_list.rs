//! List objects integration tests.

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use bytes::Bytes;
    use s3lite_core::S3Lite;
    use s3lite_core::model::{
        EncodingType, ListObjectsInput, ListObjectsV2Input, ListObjectsV2Output, PutObjectInput,
    };

    use crate::{cleanup_bucket, create_test_bucket, service};

    const KEYS: [&str; 7] = [
        "photos/2024/jan/img1.jpg",
        "photos/2024/jan/img2.jpg",
        "photos/2024/feb/img3.jpg",
        "photos/2025/mar/img4.jpg",
        "documents/report.pdf",
        "documents/readme.txt",
        "root.txt",
    ];

    async fn put_keys(s3: &S3Lite, bucket: &str, keys: &[&str]) {
        for key in keys {
            s3.put_object(
                PutObjectInput::builder()
                    .bucket(bucket)
                    .key(*key)
                    .body(Bytes::from_static(b"x"))
                    .build(),
            )
            .await
            .unwrap_or_else(|e| panic!("put {key}: {e}"));
        }
    }

    async fn list_v2(s3: &S3Lite, input: ListObjectsV2Input) -> ListObjectsV2Output {
        s3.list_objects_v2(input).await.expect("list_objects_v2")
    }

    #[tokio::test]
    async fn test_should_list_objects_v2() {
        let s3 = service();
        let bucket = create_test_bucket(&s3, "listv2").await;
        put_keys(&s3, &bucket, &KEYS).await;

        let resp = list_v2(
            &s3,
            ListObjectsV2Input::builder().bucket(bucket.clone()).build(),
        )
        .await;
        assert_eq!(resp.key_count, 7);
        assert!(!resp.is_truncated);
        assert!(resp.next_continuation_token.is_none());

        cleanup_bucket(&s3, &bucket).await;
    }

    #[tokio::test]
    async fn test_should_list_with_prefix() {
        let s3 = service();
        let bucket = create_test_bucket(&s3, "prefix").await;
        put_keys(&s3, &bucket, &KEYS).await;

        let resp = list_v2(
            &s3,
            ListObjectsV2Input::builder()
                .bucket(bucket.clone())
                .prefix("photos/2024/")
                .build(),
        )
        .await;
        assert_eq!(resp.key_count, 3);

        cleanup_bucket(&s3, &bucket).await;
    }

    #[tokio::test]
    async fn test_should_list_with_delimiter() {
        let s3 = service();
        let bucket = create_test_bucket(&s3, "delim").await;
        put_keys(&s3, &bucket, &KEYS).await;

        let resp = list_v2(
            &s3,
            ListObjectsV2Input::builder()
                .bucket(bucket.clone())
                .delimiter("/")
                .build(),
        )
        .await;

        let keys: Vec<&str> = resp.contents.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["root.txt"]);
        let prefixes: Vec<&str> = resp
            .common_prefixes
            .iter()
            .map(|p| p.prefix.as_str())
            .collect();
        assert_eq!(prefixes, vec!["documents/", "photos/"]);
        assert_eq!(resp.key_count, 3);

        cleanup_bucket(&s3, &bucket).await;
    }

    #[tokio::test]
    async fn test_should_list_with_prefix_and_delimiter() {
        let s3 = service();
        let bucket = create_test_bucket(&s3, "prefdelim").await;
        put_keys(&s3, &bucket, &KEYS).await;

        let resp = list_v2(
            &s3,
            ListObjectsV2Input::builder()
                .bucket(bucket.clone())
                .prefix("photos/2024/")
                .delimiter("/")
                .build(),
        )
        .await;

        assert!(resp.contents.is_empty());
        let prefixes: Vec<&str> = resp
            .common_prefixes
            .iter()
            .map(|p| p.prefix.as_str())
            .collect();
        assert_eq!(prefixes, vec!["photos/2024/feb/", "photos/2024/jan/"]);

        cleanup_bucket(&s3, &bucket).await;
    }

    #[tokio::test]
    async fn test_should_paginate_with_max_keys_one() {
        let s3 = service();
        let bucket = create_test_bucket(&s3, "paginate").await;
        put_keys(&s3, &bucket, &KEYS).await;

        let mut seen = Vec::new();
        let mut token: Option<String> = None;
        let mut pages = 0;
        loop {
            let input = match token.take() {
                Some(t) => ListObjectsV2Input::builder()
                    .bucket(bucket.clone())
                    .max_keys(1)
                    .continuation_token(t)
                    .build(),
                None => ListObjectsV2Input::builder()
                    .bucket(bucket.clone())
                    .max_keys(1)
                    .build(),
            };
            let resp = list_v2(&s3, input).await;
            pages += 1;
            assert_eq!(resp.key_count, 1);
            seen.extend(resp.contents.into_iter().map(|o| o.key));
            match resp.next_continuation_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        assert_eq!(pages, KEYS.len());
        let mut expected: Vec<String> = KEYS.iter().map(|k| (*k).to_owned()).collect();
        expected.sort();
        assert_eq!(seen, expected, "every key visited exactly once, in order");

        cleanup_bucket(&s3, &bucket).await;
    }

    #[tokio::test]
    async fn test_should_paginate_v1_with_markers() {
        let s3 = service();
        let bucket = create_test_bucket(&s3, "v1page").await;
        put_keys(&s3, &bucket, &KEYS).await;

        let mut seen = BTreeSet::new();
        let mut marker: Option<String> = None;
        loop {
            let input = match marker.take() {
                Some(m) => ListObjectsInput::builder()
                    .bucket(bucket.clone())
                    .max_keys(3)
                    .marker(m)
                    .build(),
                None => ListObjectsInput::builder()
                    .bucket(bucket.clone())
                    .max_keys(3)
                    .build(),
            };
            let resp = s3.list_objects(input).await.expect("list_objects");
            let last = resp.contents.last().map(|o| o.key.clone());
            for object in resp.contents {
                assert!(seen.insert(object.key), "key listed twice");
            }
            if !resp.is_truncated {
                break;
            }
            marker = last;
        }
        assert_eq!(seen.len(), KEYS.len());

        cleanup_bucket(&s3, &bucket).await;
    }

    #[tokio::test]
    async fn test_should_list_nested_prefixes_level_by_level() {
        let s3 = service();
        let bucket = create_test_bucket(&s3, "nested").await;
        put_keys(&s3, &bucket, &["dir1/dir1/dir1/dir1/"]).await;

        let mut prefix = String::new();
        for level in 1..=4 {
            let resp = list_v2(
                &s3,
                ListObjectsV2Input::builder()
                    .bucket(bucket.clone())
                    .prefix(prefix.clone())
                    .delimiter("/")
                    .build(),
            )
            .await;
            let expected = "dir1/".repeat(level);
            assert_eq!(resp.common_prefixes.len(), 1);
            assert_eq!(resp.common_prefixes[0].prefix, expected);
            prefix = expected;
        }

        cleanup_bucket(&s3, &bucket).await;
    }

    #[tokio::test]
    async fn test_should_return_exact_count_with_top_level_delimiter() {
        let s3 = service();
        let bucket = create_test_bucket(&s3, "flat").await;
        let keys: Vec<String> = (0..25).map(|i| format!("object-{i:02}")).collect();
        let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        put_keys(&s3, &bucket, &refs).await;

        let resp = list_v2(
            &s3,
            ListObjectsV2Input::builder()
                .bucket(bucket.clone())
                .delimiter("/")
                .build(),
        )
        .await;
        assert_eq!(resp.key_count, 25);
        assert!(resp.common_prefixes.is_empty());

        cleanup_bucket(&s3, &bucket).await;
    }

    #[tokio::test]
    async fn test_should_omit_contents_in_empty_v1_listing() {
        let s3 = service();
        let bucket = create_test_bucket(&s3, "emptyv1").await;

        let resp = s3
            .list_objects(ListObjectsInput::builder().bucket(bucket.clone()).build())
            .await
            .expect("list_objects");
        let json = serde_json::to_value(&resp).expect("serialize");
        assert!(json.get("Contents").is_none(), "no Contents key: {json}");
        assert_eq!(json["IsTruncated"], false);

        let v2 = list_v2(
            &s3,
            ListObjectsV2Input::builder().bucket(bucket.clone()).build(),
        )
        .await;
        let json = serde_json::to_value(&v2).expect("serialize");
        assert_eq!(json["KeyCount"], 0);

        cleanup_bucket(&s3, &bucket).await;
    }

    #[tokio::test]
    async fn test_should_url_encode_listed_keys() {
        let s3 = service();
        let bucket = create_test_bucket(&s3, "encode").await;
        put_keys(&s3, &bucket, &["a key/with spaces.txt", "plain.txt"]).await;

        let resp = list_v2(
            &s3,
            ListObjectsV2Input::builder()
                .bucket(bucket.clone())
                .delimiter("/")
                .encoding_type(EncodingType::Url)
                .build(),
        )
        .await;
        assert_eq!(resp.common_prefixes[0].prefix, "a%20key/");
        assert_eq!(resp.contents[0].key, "plain.txt");
        assert_eq!(resp.encoding_type, Some(EncodingType::Url));

        cleanup_bucket(&s3, &bucket).await;
    }

    #[tokio::test]
    async fn test_should_treat_empty_continuation_token_as_first_page() {
        let s3 = service();
        let bucket = create_test_bucket(&s3, "emptytoken").await;
        put_keys(&s3, &bucket, &KEYS).await;

        let resp = list_v2(
            &s3,
            ListObjectsV2Input::builder()
                .bucket(bucket.clone())
                .continuation_token("")
                .build(),
        )
        .await;
        assert_eq!(resp.key_count, KEYS.len());
        assert!(!resp.is_truncated);
        let mut expected: Vec<&str> = KEYS.to_vec();
        expected.sort_unstable();
        let keys: Vec<&str> = resp.contents.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, expected);

        cleanup_bucket(&s3, &bucket).await;
    }
}

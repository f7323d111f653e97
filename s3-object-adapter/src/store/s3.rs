/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Error;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration, Tag, Tagging};
use aws_smithy_runtime_api::http::Response as HttpResponse;
use bytes::Bytes;
use tokio::sync::{Semaphore, SemaphorePermit};

use super::{ListedKey, ObjectStore, StoredObject};
use crate::error::{self, Error};
use crate::types::{ContainerTags, ObjectMetadata};

/// Region that rejects an explicit location constraint on `CreateBucket`.
const DEFAULT_REGION: &str = "us-east-1";

/// [`ObjectStore`] implementation over an [`aws_sdk_s3::Client`].
///
/// The number of requests in flight at once is bounded by a semaphore that can be shared
/// between successive stores, so that replacing a connection does not reset the limit.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: aws_sdk_s3::Client,
    permits: Arc<Semaphore>,
}

impl S3Store {
    /// Wrap `client` without limiting concurrent requests.
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self::with_permits(client, Arc::new(Semaphore::new(Semaphore::MAX_PERMITS)))
    }

    /// Wrap `client`, allowing at most as many concurrent requests as `permits` holds.
    pub fn with_permits(client: aws_sdk_s3::Client, permits: Arc<Semaphore>) -> Self {
        Self { client, permits }
    }

    /// The Amazon S3 client instance used to send requests.
    pub fn client(&self) -> &aws_sdk_s3::Client {
        &self.client
    }

    async fn permit(&self) -> Result<SemaphorePermit<'_>, Error> {
        Ok(self.permits.acquire().await?)
    }

    fn location_constraint(&self) -> Option<CreateBucketConfiguration> {
        self.client
            .config()
            .region()
            .map(|region| region.as_ref())
            .filter(|region| *region != DEFAULT_REGION)
            .map(|region| {
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build()
            })
    }
}

/// Convert an SDK error, reporting a missing resource as [`ErrorKind::NotFound`].
///
/// `is_missing` recognizes the operation's modeled not-found variant; the error code and
/// HTTP status are checked as well since S3-compatible stores do not always send the
/// modeled error.
///
/// [`ErrorKind::NotFound`]: crate::error::ErrorKind::NotFound
fn classify<E>(err: SdkError<E, HttpResponse>, is_missing: fn(&E) -> bool) -> Error
where
    E: std::error::Error + ProvideErrorMetadata + Send + Sync + 'static,
{
    let missing = err.as_service_error().is_some_and(is_missing)
        || err
            .raw_response()
            .is_some_and(|resp| resp.status().as_u16() == 404);
    if missing {
        error::not_found(err)
    } else {
        err.into()
    }
}

fn never_missing<E>(_: &E) -> bool {
    false
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject, Error> {
        let _permit = self.permit().await?;
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| classify(err, GetObjectError::is_no_such_key))?;
        let metadata = resp.metadata.unwrap_or_default();
        let body = resp.body.collect().await?.into_bytes();
        tracing::trace!("fetched {bucket}/{key} ({} bytes)", body.len());
        Ok(StoredObject::new(body, metadata))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        metadata: Option<ObjectMetadata>,
    ) -> Result<(), Error> {
        let _permit = self.permit().await?;
        tracing::trace!("putting {bucket}/{key} ({} bytes)", body.len());
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .set_metadata(metadata)
            .send()
            .await
            .map_err(|err| classify(err, never_missing))?;
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), Error> {
        let _permit = self.permit().await?;
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| classify(err, never_missing))?;
        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, Error> {
        let _permit = self.permit().await?;
        let resp = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| classify(err, HeadObjectError::is_not_found))?;
        Ok(resp.metadata.unwrap_or_default())
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ListedKey>, Error> {
        let mut keys = Vec::new();
        let mut continuation_token = None;
        loop {
            let resp = {
                let _permit = self.permit().await?;
                self.client
                    .list_objects_v2()
                    .bucket(bucket)
                    .prefix(prefix)
                    .set_continuation_token(continuation_token.take())
                    .send()
                    .await
                    .map_err(|err| classify(err, ListObjectsV2Error::is_no_such_bucket))?
            };

            for object in resp.contents() {
                if let Some(key) = object.key() {
                    let last_modified = object
                        .last_modified()
                        .and_then(|ts| SystemTime::try_from(*ts).ok());
                    keys.push(ListedKey::new(key, last_modified));
                }
            }

            match resp.next_continuation_token() {
                Some(token) if resp.is_truncated().unwrap_or(false) => {
                    continuation_token = Some(token.to_owned());
                }
                _ => break,
            }
        }
        tracing::trace!("listed {} keys under {bucket}/{prefix}", keys.len());
        Ok(keys)
    }

    async fn get_object_tagging(&self, bucket: &str, key: &str) -> Result<ContainerTags, Error> {
        let _permit = self.permit().await?;
        let resp = self
            .client
            .get_object_tagging()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| classify(err, never_missing))?;
        Ok(resp
            .tag_set()
            .iter()
            .map(|tag| (tag.key().to_owned(), tag.value().to_owned()))
            .collect())
    }

    async fn put_object_tagging(
        &self,
        bucket: &str,
        key: &str,
        tags: &ContainerTags,
    ) -> Result<(), Error> {
        let tag_set = tags
            .iter()
            .map(|(k, v)| Tag::builder().key(k).value(v).build())
            .collect::<Result<Vec<_>, _>>()?;
        let tagging = Tagging::builder().set_tag_set(Some(tag_set)).build()?;

        let _permit = self.permit().await?;
        self.client
            .put_object_tagging()
            .bucket(bucket)
            .key(key)
            .tagging(tagging)
            .send()
            .await
            .map_err(|err| classify(err, never_missing))?;
        Ok(())
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, Error> {
        let _permit = self.permit().await?;
        let result = self
            .client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|err| classify(err, HeadBucketError::is_not_found));
        match result {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            // the bucket is there, it just belongs to someone else
            Err(err) if is_access_denied(&err) => Ok(true),
            Err(err) => Err(err),
        }
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), Error> {
        let _permit = self.permit().await?;
        tracing::debug!("creating bucket {bucket}");
        self.client
            .create_bucket()
            .bucket(bucket)
            .set_create_bucket_configuration(self.location_constraint())
            .send()
            .await
            .map_err(|err| classify(err, never_missing))?;
        Ok(())
    }
}

fn is_access_denied(err: &Error) -> bool {
    let sdk_err = std::error::Error::source(err)
        .and_then(|source| source.downcast_ref::<SdkError<HeadBucketError, HttpResponse>>());
    match sdk_err {
        Some(sdk_err) => {
            sdk_err.code() == Some("AccessDenied")
                || sdk_err
                    .raw_response()
                    .is_some_and(|resp| resp.status().as_u16() == 403)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use aws_sdk_s3::operation::get_object::{GetObjectError, GetObjectOutput};
    use aws_sdk_s3::operation::get_object_tagging::GetObjectTaggingOutput;
    use aws_sdk_s3::operation::head_bucket::{HeadBucketError, HeadBucketOutput};
    use aws_sdk_s3::operation::head_object::{HeadObjectError, HeadObjectOutput};
    use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
    use aws_sdk_s3::operation::put_object_tagging::PutObjectTaggingOutput;
    use aws_sdk_s3::primitives::ByteStream;
    use aws_sdk_s3::types::{Object, Tag};
    use aws_smithy_mocks_experimental::{mock, RuleMode};
    use aws_smithy_types::error::ErrorMetadata;
    use test_common::mock_client_with_stubbed_http_client;

    use super::S3Store;
    use crate::error::ErrorKind;
    use crate::store::ObjectStore;

    fn head_bucket_error(code: &'static str) -> impl Fn() -> HeadBucketError {
        move || HeadBucketError::generic(ErrorMetadata::builder().code(code).build())
    }

    #[tokio::test]
    async fn test_bucket_exists() {
        let found = mock!(aws_sdk_s3::Client::head_bucket)
            .then_output(|| HeadBucketOutput::builder().build());
        let missing =
            mock!(aws_sdk_s3::Client::head_bucket).then_error(head_bucket_error("NotFound"));
        let denied =
            mock!(aws_sdk_s3::Client::head_bucket).then_error(head_bucket_error("AccessDenied"));
        let client = mock_client_with_stubbed_http_client!(
            aws_sdk_s3,
            RuleMode::Sequential,
            &[&found, &missing, &denied]
        );
        let store = S3Store::new(client);

        assert!(store.bucket_exists("test-bucket").await.unwrap());
        assert!(!store.bucket_exists("test-bucket").await.unwrap());
        assert!(store.bucket_exists("test-bucket").await.unwrap());
    }

    #[tokio::test]
    async fn test_bucket_exists_probe_failure() {
        let broken = mock!(aws_sdk_s3::Client::head_bucket)
            .then_error(head_bucket_error("InvalidAccessKeyId"));
        let client = mock_client_with_stubbed_http_client!(aws_sdk_s3, &[&broken]);
        let store = S3Store::new(client);

        let err = store.bucket_exists("test-bucket").await.unwrap_err();
        assert_eq!(&ErrorKind::ObjectStoreUnavailable, err.kind());
    }

    #[tokio::test]
    async fn test_head_object_not_found() {
        let head = mock!(aws_sdk_s3::Client::head_object)
            .match_requests(|r| r.bucket() == Some("test-bucket") && r.key() == Some("a/b"))
            .then_error(|| HeadObjectError::generic(ErrorMetadata::builder().code("NotFound").build()));
        let client = mock_client_with_stubbed_http_client!(aws_sdk_s3, &[&head]);
        let store = S3Store::new(client);

        assert!(!store.object_exists("test-bucket", "a/b").await.unwrap());
    }

    #[tokio::test]
    async fn test_head_object_metadata() {
        let head = mock!(aws_sdk_s3::Client::head_object).then_output(|| {
            HeadObjectOutput::builder()
                .metadata("status", "processed")
                .build()
        });
        let client = mock_client_with_stubbed_http_client!(aws_sdk_s3, &[&head]);
        let store = S3Store::new(client);

        let metadata = store.head_object("test-bucket", "a/b").await.unwrap();
        assert_eq!(Some("processed"), metadata.get("status").map(String::as_str));
    }

    #[tokio::test]
    async fn test_get_object() {
        let get = mock!(aws_sdk_s3::Client::get_object)
            .match_requests(|r| r.key() == Some("src/proc/obj"))
            .then_output(|| {
                GetObjectOutput::builder()
                    .body(ByteStream::from_static(b"packet bytes"))
                    .metadata("count", "5")
                    .build()
            });
        let client = mock_client_with_stubbed_http_client!(aws_sdk_s3, &[&get]);
        let store = S3Store::new(client);

        let object = store.get_object("test-bucket", "src/proc/obj").await.unwrap();
        assert_eq!(&b"packet bytes"[..], &object.body()[..]);
        assert_eq!(Some("5"), object.metadata().get("count").map(String::as_str));
    }

    #[tokio::test]
    async fn test_get_object_no_such_key() {
        let get = mock!(aws_sdk_s3::Client::get_object).then_error(|| {
            GetObjectError::generic(ErrorMetadata::builder().code("NoSuchKey").build())
        });
        let client = mock_client_with_stubbed_http_client!(aws_sdk_s3, &[&get]);
        let store = S3Store::new(client);

        let err = store.get_object("test-bucket", "missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_objects_paginates() {
        let page1 = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|r| r.prefix() == Some("cont/") && r.continuation_token().is_none())
            .then_output(|| {
                ListObjectsV2Output::builder()
                    .contents(Object::builder().key("cont/a").build())
                    .contents(Object::builder().key("cont/b").build())
                    .is_truncated(true)
                    .next_continuation_token("token1")
                    .build()
            });
        let page2 = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|r| r.continuation_token() == Some("token1"))
            .then_output(|| {
                ListObjectsV2Output::builder()
                    .contents(Object::builder().key("cont/c").build())
                    .is_truncated(false)
                    .build()
            });
        let client = mock_client_with_stubbed_http_client!(aws_sdk_s3, &[&page1, &page2]);
        let store = S3Store::new(client);

        let keys = store.list_objects("test-bucket", "cont/").await.unwrap();
        let keys: Vec<_> = keys.iter().map(|k| k.key()).collect();
        assert_eq!(vec!["cont/a", "cont/b", "cont/c"], keys);
    }

    #[tokio::test]
    async fn test_object_tagging() {
        let get_tags = mock!(aws_sdk_s3::Client::get_object_tagging).then_output(|| {
            GetObjectTaggingOutput::builder()
                .tag_set(Tag::builder().key("x").value("1").build().unwrap())
                .tag_set(Tag::builder().key("y").value("2").build().unwrap())
                .build()
                .unwrap()
        });
        let put_tags = mock!(aws_sdk_s3::Client::put_object_tagging)
            .match_requests(|r| r.tagging().map(|t| t.tag_set().len()) == Some(2))
            .then_output(|| PutObjectTaggingOutput::builder().build());
        let client = mock_client_with_stubbed_http_client!(aws_sdk_s3, &[&get_tags, &put_tags]);
        let store = S3Store::new(client);

        let tags = store.get_object_tagging("test-bucket", "tags").await.unwrap();
        let expected: HashMap<String, String> =
            HashMap::from([("x".into(), "1".into()), ("y".into(), "2".into())]);
        assert_eq!(expected, tags);

        store
            .put_object_tagging("test-bucket", "tags", &tags)
            .await
            .unwrap();
    }
}

/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use async_trait::async_trait;
use bytes::Bytes;
use s3_object_adapter::connection::{Connector, SharedStore};
use s3_object_adapter::error::{Error, ErrorKind};
use s3_object_adapter::store::{ListedKey, ObjectStore, StoredObject};
use s3_object_adapter::types::{ContainerTags, ObjectMetadata};

#[doc(hidden)]
pub mod __private {
    pub use aws_smithy_mocks_experimental;
    pub use aws_smithy_runtime;
    pub use aws_smithy_types;
    pub use http_02x;
}

/// Create an S3 client whose responses come from `aws_smithy_mocks_experimental` rules.
///
/// Requests that no rule intercepts are answered by a stubbed HTTP client instead of
/// going out on the network.
#[macro_export]
macro_rules! mock_client_with_stubbed_http_client {
    ($aws_crate: ident, $rules: expr) => {
        $crate::mock_client_with_stubbed_http_client!(
            $aws_crate,
            $crate::__private::aws_smithy_mocks_experimental::RuleMode::Sequential,
            $rules
        )
    };
    ($aws_crate: ident, $rule_mode: expr, $rules: expr) => {{
        use $crate::__private::aws_smithy_mocks_experimental::mock_client;

        mock_client!($aws_crate, $rule_mode, $rules, |client_builder| {
            client_builder.http_client(
                $crate::__private::aws_smithy_runtime::client::http::test_util::infallible_client_fn(
                    |_req| {
                        $crate::__private::http_02x::Response::builder()
                            .status(200)
                            .body($crate::__private::aws_smithy_types::body::SdkBody::empty())
                            .unwrap()
                    },
                ),
            )
        })
    }};
}

#[derive(Debug, Clone)]
struct Entry {
    body: Bytes,
    metadata: ObjectMetadata,
    tags: ContainerTags,
    last_modified: SystemTime,
}

type Buckets = HashMap<String, BTreeMap<String, Entry>>;

/// An [`ObjectStore`] that keeps every bucket in memory.
///
/// Clones share the stored data. A store can be taken offline, after which every call
/// fails, or handed out as separate connections that can be closed one by one.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    buckets: Arc<Mutex<Buckets>>,
    offline: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `bucket` up front.
    pub fn with_bucket(self, bucket: &str) -> Self {
        self.buckets().entry(bucket.to_owned()).or_default();
        self
    }

    /// Store `body` under `bucket`/`key`, creating the bucket if needed.
    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Bytes>, metadata: ObjectMetadata) {
        self.buckets().entry(bucket.to_owned()).or_default().insert(
            key.to_owned(),
            Entry {
                body: body.into(),
                metadata,
                tags: ContainerTags::new(),
                last_modified: SystemTime::now(),
            },
        );
    }

    /// Make every call fail (`true`) or succeed again (`false`).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Returns whether `bucket` exists.
    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.buckets().contains_key(bucket)
    }

    /// Every key stored in `bucket`, in order.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// The stored body of `bucket`/`key`.
    pub fn body(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.entry(bucket, key).map(|entry| entry.body)
    }

    /// The tag-set of `bucket`/`key`.
    pub fn tags(&self, bucket: &str, key: &str) -> Option<ContainerTags> {
        self.entry(bucket, key).map(|entry| entry.tags)
    }

    /// A new connection to the same data that can be closed independently.
    fn connection(&self) -> InMemoryStore {
        InMemoryStore {
            buckets: self.buckets.clone(),
            offline: self.offline.clone(),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    fn buckets(&self) -> std::sync::MutexGuard<'_, Buckets> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn entry(&self, bucket: &str, key: &str) -> Option<Entry> {
        self.buckets().get(bucket)?.get(key).cloned()
    }

    fn check(&self) -> Result<(), Error> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::new(ErrorKind::ObjectStoreUnavailable, "store is offline"));
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::new(ErrorKind::ObjectStoreUnavailable, "connection is closed"));
        }
        Ok(())
    }

    fn with_entry<T>(
        &self,
        bucket: &str,
        key: &str,
        f: impl FnOnce(&mut Entry) -> T,
    ) -> Result<T, Error> {
        self.check()?;
        let mut buckets = self.buckets();
        let objects = buckets.get_mut(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        let entry = objects
            .get_mut(key)
            .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("no such key: {bucket}/{key}")))?;
        Ok(f(entry))
    }
}

fn no_such_bucket(bucket: &str) -> Error {
    Error::new(ErrorKind::NotFound, format!("no such bucket: {bucket}"))
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject, Error> {
        self.with_entry(bucket, key, |entry| {
            StoredObject::new(entry.body.clone(), entry.metadata.clone())
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        metadata: Option<ObjectMetadata>,
    ) -> Result<(), Error> {
        self.check()?;
        let mut buckets = self.buckets();
        let objects = buckets.get_mut(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        objects.insert(
            key.to_owned(),
            Entry {
                body,
                metadata: metadata.unwrap_or_default(),
                tags: ContainerTags::new(),
                last_modified: SystemTime::now(),
            },
        );
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), Error> {
        self.check()?;
        let mut buckets = self.buckets();
        let objects = buckets.get_mut(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        objects.remove(key);
        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, Error> {
        self.with_entry(bucket, key, |entry| entry.metadata.clone())
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ListedKey>, Error> {
        self.check()?;
        let buckets = self.buckets();
        let objects = buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        Ok(objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, entry)| ListedKey::new(key.clone(), Some(entry.last_modified)))
            .collect())
    }

    async fn get_object_tagging(&self, bucket: &str, key: &str) -> Result<ContainerTags, Error> {
        self.with_entry(bucket, key, |entry| entry.tags.clone())
    }

    async fn put_object_tagging(
        &self,
        bucket: &str,
        key: &str,
        tags: &ContainerTags,
    ) -> Result<(), Error> {
        self.with_entry(bucket, key, |entry| entry.tags = tags.clone())
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, Error> {
        self.check()?;
        Ok(self.has_bucket(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), Error> {
        self.check()?;
        self.buckets().entry(bucket.to_owned()).or_default();
        Ok(())
    }
}

/// A [`Connector`] over an [`InMemoryStore`] that can be told to fail.
///
/// Clones share their counters, so a test can keep one clone while the client owns another.
#[derive(Debug, Clone, Default)]
pub struct FlakyConnector {
    store: InMemoryStore,
    failures: Arc<AtomicU32>,
    attempts: Arc<AtomicU32>,
    issued: Arc<Mutex<Vec<Arc<AtomicBool>>>>,
}

impl FlakyConnector {
    /// Create a connector that always succeeds.
    pub fn new(store: InMemoryStore) -> Self {
        Self {
            store,
            ..Default::default()
        }
    }

    /// Fail the next `failures` connection attempts.
    pub fn fail_next(&self, failures: u32) {
        self.failures.store(failures, Ordering::SeqCst);
    }

    /// Number of connection attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Close every connection handed out so far. Later connections are unaffected.
    pub fn close_connections(&self) {
        for closed in self.issued.lock().unwrap_or_else(PoisonError::into_inner).iter() {
            closed.store(true, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl Connector for FlakyConnector {
    async fn connect(&self) -> Result<SharedStore, Error> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::new(
                ErrorKind::ObjectStoreUnavailable,
                "connection refused",
            ));
        }

        let connection = self.store.connection();
        self.issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(connection.closed.clone());
        Ok(Arc::new(connection))
    }
}

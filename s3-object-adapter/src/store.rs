/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::time::SystemTime;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Error;
use crate::types::{ContainerTags, ObjectMetadata};

/// [`ObjectStore`] backed by the AWS SDK for Rust
pub mod s3;

pub use s3::S3Store;

/// An object body together with its user metadata.
#[derive(Debug, Clone, Default)]
pub struct StoredObject {
    body: Bytes,
    metadata: ObjectMetadata,
}

impl StoredObject {
    /// Create a new stored object.
    pub fn new(body: impl Into<Bytes>, metadata: ObjectMetadata) -> Self {
        Self {
            body: body.into(),
            metadata,
        }
    }

    /// The object body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The user metadata attached to the object.
    pub fn metadata(&self) -> &ObjectMetadata {
        &self.metadata
    }

    /// Consume the object, returning the body and metadata.
    pub fn into_parts(self) -> (Bytes, ObjectMetadata) {
        (self.body, self.metadata)
    }
}

/// A key returned by [`ObjectStore::list_objects`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedKey {
    key: String,
    last_modified: Option<SystemTime>,
}

impl ListedKey {
    /// Create a new listing entry.
    pub fn new(key: impl Into<String>, last_modified: Option<SystemTime>) -> Self {
        Self {
            key: key.into(),
            last_modified,
        }
    }

    /// The full object key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// When the object was last modified, if reported by the backend.
    pub fn last_modified(&self) -> Option<SystemTime> {
        self.last_modified
    }
}

/// The operations the adapter needs from an object store backend.
///
/// Implementations report a missing bucket or key with
/// [`ErrorKind::NotFound`](crate::error::ErrorKind::NotFound); every other failure is
/// treated as possibly transient by the callers.
#[async_trait]
pub trait ObjectStore: Send + Sync + fmt::Debug {
    /// Fetch an object's body and user metadata.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject, Error>;

    /// Write an object, replacing any existing object and its metadata.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        metadata: Option<ObjectMetadata>,
    ) -> Result<(), Error>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), Error>;

    /// Fetch only the user metadata of an object.
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, Error>;

    /// List every key in `bucket` starting with `prefix`.
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ListedKey>, Error>;

    /// Read the tag-set of an object.
    async fn get_object_tagging(&self, bucket: &str, key: &str) -> Result<ContainerTags, Error>;

    /// Replace the whole tag-set of an object.
    async fn put_object_tagging(
        &self,
        bucket: &str,
        key: &str,
        tags: &ContainerTags,
    ) -> Result<(), Error>;

    /// Returns whether `bucket` exists. Also used as the liveness probe for a connection.
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, Error>;

    /// Create `bucket`.
    async fn create_bucket(&self, bucket: &str) -> Result<(), Error>;

    /// Returns whether an object exists.
    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool, Error> {
        match self.head_object(bucket, key).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }
}

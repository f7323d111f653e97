/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use bytes::Bytes;

use crate::connection::{ConnectionManager, ConnectionState};
use crate::error::Error;
use crate::operation::list_objects::ListObjects;
use crate::operation::metadata::{AddMetadata, AdjustCounter, GetMetadata};
use crate::operation::object::{DeleteObject, GetObject, ObjectExists, PutObject};
use crate::operation::tags::{AddTags, GetTags};
use crate::types::{AddressingMode, ContainerTags, ListedObject, ObjectIdentity, ObjectMetadata, Outcome};
use crate::Config;

/// Object store adapter client for Amazon S3 and S3-compatible storage.
///
/// Cloning a client is cheap; clones share the configuration and the connection.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) handle: Arc<Handle>,
}

/// Whatever is needed to carry out operations: the configuration and the shared connection
#[derive(Debug)]
pub(crate) struct Handle {
    pub(crate) config: Config,
    pub(crate) connections: ConnectionManager,
}

impl Client {
    /// Creates a new client from an adapter config.
    ///
    /// No connection is made until the first operation.
    pub fn new(config: Config) -> Client {
        let connections = ConnectionManager::new(config.connector().clone(), config.max_retries());
        let handle = Arc::new(Handle {
            config,
            connections,
        });
        Client { handle }
    }

    /// Returns the client's configuration
    pub fn config(&self) -> &Config {
        &self.handle.config
    }

    /// Returns the state of the connection to the object store
    pub fn connection_state(&self) -> ConnectionState {
        self.handle.connections.state()
    }

    /// Read the body of an object.
    ///
    /// A missing object is reported as
    /// [`ErrorKind::ObjectStoreUnavailable`](crate::error::ErrorKind::ObjectStoreUnavailable),
    /// like any other failure.
    pub async fn get_object(&self, id: &ObjectIdentity) -> Result<Bytes, Error> {
        GetObject::orchestrate(&self.handle, id, self.config().addressing_mode()).await
    }

    /// Read the body of an object, resolving its location with `mode` instead of the
    /// configured addressing mode.
    pub async fn get_object_with_mode(
        &self,
        id: &ObjectIdentity,
        mode: AddressingMode,
    ) -> Result<Bytes, Error> {
        GetObject::orchestrate(&self.handle, id, mode).await
    }

    /// Write the body of an object, creating its bucket if needed.
    ///
    /// Returns `true` once the object is stored.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use s3_object_adapter::types::ObjectIdentity;
    ///
    /// async fn store_packet(
    ///     client: &s3_object_adapter::Client,
    /// ) -> Result<(), s3_object_adapter::error::Error> {
    ///     let id = ObjectIdentity::new("registration", "10001100010002", "packet.zip");
    ///     client.put_object(&id, vec![0u8; 16]).await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn put_object(&self, id: &ObjectIdentity, body: impl Into<Bytes>) -> Result<bool, Error> {
        PutObject::orchestrate(&self.handle, id, body.into()).await
    }

    /// Returns whether the object exists.
    ///
    /// Never fails. Any error talking to the object store is logged and reported as `false`.
    pub async fn exists(&self, id: &ObjectIdentity) -> bool {
        ObjectExists::orchestrate(&self.handle, id).await
    }

    /// Delete an object. Deleting an object that does not exist succeeds.
    pub async fn delete_object(&self, id: &ObjectIdentity) -> Result<bool, Error> {
        DeleteObject::orchestrate(&self.handle, id, self.config().addressing_mode()).await
    }

    /// Delete an object, resolving its location with `mode` instead of the configured
    /// addressing mode.
    pub async fn delete_object_with_mode(
        &self,
        id: &ObjectIdentity,
        mode: AddressingMode,
    ) -> Result<bool, Error> {
        DeleteObject::orchestrate(&self.handle, id, mode).await
    }

    /// Merge `metadata` into the user metadata of an object. Entries in `metadata` replace
    /// stored entries with the same key.
    ///
    /// Returns the merged metadata. The object body is downloaded and uploaded again
    /// unchanged along with the merged metadata.
    pub async fn add_object_metadata(
        &self,
        id: &ObjectIdentity,
        metadata: ObjectMetadata,
    ) -> Result<ObjectMetadata, Error> {
        AddMetadata::orchestrate(&self.handle, id, metadata).await
    }

    /// Set a single user metadata entry on an object. A `None` value is stored as an empty
    /// string.
    pub async fn add_object_metadata_entry(
        &self,
        id: &ObjectIdentity,
        key: impl Into<String>,
        value: Option<&str>,
    ) -> Result<ObjectMetadata, Error> {
        let entry = ObjectMetadata::from([(key.into(), value.unwrap_or_default().to_owned())]);
        AddMetadata::orchestrate(&self.handle, id, entry).await
    }

    /// Read the user metadata of an object.
    pub async fn get_metadata(&self, id: &ObjectIdentity) -> Result<ObjectMetadata, Error> {
        GetMetadata::orchestrate(&self.handle, id).await
    }

    /// Increment the integer user metadata entry `key`.
    ///
    /// Returns the new value, or `None` (without writing) when the object has no such entry.
    /// Concurrent updates of the same object are not serialized; the last write wins.
    pub async fn inc_metadata(&self, id: &ObjectIdentity, key: &str) -> Result<Option<i64>, Error> {
        AdjustCounter::orchestrate(&self.handle, id, key, 1).await
    }

    /// Decrement the integer user metadata entry `key`. See [`inc_metadata`](Self::inc_metadata).
    pub async fn dec_metadata(&self, id: &ObjectIdentity, key: &str) -> Result<Option<i64>, Error> {
        AdjustCounter::orchestrate(&self.handle, id, key, -1).await
    }

    /// Merge `tags` into the tags of `container`.
    ///
    /// Returns `tags` as given, not the merged tag-set.
    pub async fn add_tags(
        &self,
        account: &str,
        container: &str,
        tags: ContainerTags,
    ) -> Result<ContainerTags, Error> {
        AddTags::orchestrate(&self.handle, account, container, tags).await
    }

    /// Read the tags of `container`. A container that was never tagged has no tags.
    pub async fn get_tags(&self, account: &str, container: &str) -> Result<ContainerTags, Error> {
        GetTags::orchestrate(&self.handle, account, container).await
    }

    /// List the objects stored for `container`.
    ///
    /// Returns `None` when nothing at all is stored for the container. The tag marker is
    /// never listed.
    pub async fn get_all_objects(
        &self,
        account: &str,
        container: &str,
    ) -> Result<Option<Vec<ListedObject>>, Error> {
        ListObjects::orchestrate(&self.handle, account, container).await
    }

    /// Removing a container is not supported by this backend.
    pub async fn remove_container(
        &self,
        _account: &str,
        container: &str,
        _source: Option<&str>,
        _process: Option<&str>,
    ) -> Outcome<()> {
        tracing::debug!("remove container is not supported, ignoring request for {container}");
        Outcome::Unsupported
    }

    /// Packing a container is not supported by this backend.
    pub async fn pack(
        &self,
        _account: &str,
        container: &str,
        _source: Option<&str>,
        _process: Option<&str>,
    ) -> Outcome<()> {
        tracing::debug!("pack is not supported, ignoring request for {container}");
        Outcome::Unsupported
    }
}

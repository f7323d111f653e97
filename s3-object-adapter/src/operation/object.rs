/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_sdk_s3::error::DisplayErrorContext;
use bytes::Bytes;

use super::{ensure_bucket, failed};
use crate::client::Handle;
use crate::error::Error;
use crate::key::{self, StorageLocation};
use crate::types::{AddressingMode, ObjectIdentity};

/// Operation struct for reading an object body
#[derive(Clone, Default, Debug)]
pub(crate) struct GetObject;

impl GetObject {
    #[tracing::instrument(skip_all, level = "debug", name = "get-object", fields(container = id.container(), object = id.object_name()))]
    pub(crate) async fn orchestrate(
        handle: &Handle,
        id: &ObjectIdentity,
        mode: AddressingMode,
    ) -> Result<Bytes, Error> {
        let location = key::resolve(id, mode);
        get_object(handle, &location)
            .await
            .map_err(|err| failed("getObject", id.container(), err))
    }
}

async fn get_object(handle: &Handle, location: &StorageLocation) -> Result<Bytes, Error> {
    let store = handle.connections.get(location.bucket()).await?;
    let object = store.get_object(location.bucket(), location.key()).await?;
    tracing::trace!(
        "read {} bytes from {}/{}",
        object.body().len(),
        location.bucket(),
        location.key()
    );
    Ok(object.into_parts().0)
}

/// Operation struct for writing an object body
#[derive(Clone, Default, Debug)]
pub(crate) struct PutObject;

impl PutObject {
    /// Write `body`, creating the bucket first when needed. Any existing user metadata on the
    /// object is replaced.
    #[tracing::instrument(skip_all, level = "debug", name = "put-object", fields(container = id.container(), object = id.object_name()))]
    pub(crate) async fn orchestrate(
        handle: &Handle,
        id: &ObjectIdentity,
        body: Bytes,
    ) -> Result<bool, Error> {
        let location = key::resolve(id, handle.config.addressing_mode());
        put_object(handle, &location, body)
            .await
            .map_err(|err| failed("putObject", id.container(), err))?;
        Ok(true)
    }
}

async fn put_object(handle: &Handle, location: &StorageLocation, body: Bytes) -> Result<(), Error> {
    let store = handle.connections.get(location.bucket()).await?;
    ensure_bucket(&store, location.bucket()).await?;
    store
        .put_object(location.bucket(), location.key(), body, None)
        .await
}

/// Operation struct for deleting an object
#[derive(Clone, Default, Debug)]
pub(crate) struct DeleteObject;

impl DeleteObject {
    /// Delete the object. Succeeds whether or not the object (or its bucket) existed.
    #[tracing::instrument(skip_all, level = "debug", name = "delete-object", fields(container = id.container(), object = id.object_name()))]
    pub(crate) async fn orchestrate(
        handle: &Handle,
        id: &ObjectIdentity,
        mode: AddressingMode,
    ) -> Result<bool, Error> {
        let location = key::resolve(id, mode);
        let store = handle
            .connections
            .get(location.bucket())
            .await
            .map_err(|err| failed("deleteObject", id.container(), err))?;
        match store.delete_object(location.bucket(), location.key()).await {
            Ok(()) => Ok(true),
            Err(err) if err.is_not_found() => {
                tracing::debug!("nothing to delete at {}/{}", location.bucket(), location.key());
                Ok(true)
            }
            Err(err) => Err(failed("deleteObject", id.container(), err)),
        }
    }
}

/// Operation struct for checking whether an object exists
#[derive(Clone, Default, Debug)]
pub(crate) struct ObjectExists;

impl ObjectExists {
    /// Never fails: a missing object and an unreachable store both answer `false`.
    #[tracing::instrument(skip_all, level = "debug", name = "exists", fields(container = id.container(), object = id.object_name()))]
    pub(crate) async fn orchestrate(handle: &Handle, id: &ObjectIdentity) -> bool {
        let location = key::resolve(id, handle.config.addressing_mode());
        let result = match handle.connections.get(location.bucket()).await {
            Ok(store) => store.object_exists(location.bucket(), location.key()).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(true) => true,
            Ok(false) => {
                tracing::debug!("object not found in object store for {}", id.container());
                false
            }
            Err(err) => {
                tracing::error!(
                    "could not check object existence for {}: {}",
                    id.container(),
                    DisplayErrorContext(&err)
                );
                false
            }
        }
    }
}

/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use super::failed;
use crate::client::Handle;
use crate::error::{self, Error};
use crate::key::{self, StorageLocation};
use crate::types::{ObjectIdentity, ObjectMetadata};

/// Operation struct for reading the user metadata of an object
#[derive(Clone, Default, Debug)]
pub(crate) struct GetMetadata;

impl GetMetadata {
    #[tracing::instrument(skip_all, level = "debug", name = "get-metadata", fields(container = id.container(), object = id.object_name()))]
    pub(crate) async fn orchestrate(
        handle: &Handle,
        id: &ObjectIdentity,
    ) -> Result<ObjectMetadata, Error> {
        let location = key::resolve(id, handle.config.addressing_mode());
        get_metadata(handle, &location)
            .await
            .map_err(|err| failed("getMetaData", id.container(), err))
    }
}

async fn get_metadata(handle: &Handle, location: &StorageLocation) -> Result<ObjectMetadata, Error> {
    let store = handle.connections.get(location.bucket()).await?;
    store.head_object(location.bucket(), location.key()).await
}

/// Operation struct for merging entries into the user metadata of an object
#[derive(Clone, Default, Debug)]
pub(crate) struct AddMetadata;

impl AddMetadata {
    /// Merge `entries` over the stored metadata and rewrite the object with the result.
    ///
    /// The backend cannot patch metadata in place, so the body is downloaded and uploaded
    /// again unchanged. Returns the merged metadata.
    #[tracing::instrument(skip_all, level = "debug", name = "add-metadata", fields(container = id.container(), object = id.object_name()))]
    pub(crate) async fn orchestrate(
        handle: &Handle,
        id: &ObjectIdentity,
        entries: ObjectMetadata,
    ) -> Result<ObjectMetadata, Error> {
        let location = key::resolve(id, handle.config.addressing_mode());
        add_metadata(handle, &location, entries)
            .await
            .map_err(|err| failed("addObjectMetaData", id.container(), err))
    }
}

async fn add_metadata(
    handle: &Handle,
    location: &StorageLocation,
    entries: ObjectMetadata,
) -> Result<ObjectMetadata, Error> {
    let store = handle.connections.get(location.bucket()).await?;
    let (body, mut metadata) = store
        .get_object(location.bucket(), location.key())
        .await?
        .into_parts();

    metadata.extend(entries);
    tracing::trace!(
        "rewriting {}/{} with {} metadata entries",
        location.bucket(),
        location.key(),
        metadata.len()
    );
    store
        .put_object(location.bucket(), location.key(), body, Some(metadata.clone()))
        .await?;
    Ok(metadata)
}

/// Operation struct for incrementing or decrementing an integer metadata value
#[derive(Clone, Default, Debug)]
pub(crate) struct AdjustCounter;

impl AdjustCounter {
    /// Add `delta` to the integer stored under `key`.
    ///
    /// Returns `None` without writing anything when the object has no `key` entry.
    #[tracing::instrument(skip_all, level = "debug", name = "adjust-counter", fields(container = id.container(), object = id.object_name(), key = key, delta = delta))]
    pub(crate) async fn orchestrate(
        handle: &Handle,
        id: &ObjectIdentity,
        key: &str,
        delta: i64,
    ) -> Result<Option<i64>, Error> {
        let mut metadata = GetMetadata::orchestrate(handle, id).await?;
        let Some(current) = metadata.get(key) else {
            tracing::debug!("no metadata entry {key} to adjust");
            return Ok(None);
        };

        let value = next_value(key, current, delta)?;
        metadata.insert(key.to_owned(), value.to_string());
        AddMetadata::orchestrate(handle, id, metadata).await?;
        Ok(Some(value))
    }
}

fn next_value(key: &str, current: &str, delta: i64) -> Result<i64, Error> {
    let current: i64 = current.trim().parse().map_err(|err| {
        error::invalid_metadata(format!(
            "metadata entry {key}={current:?} is not an integer: {err}"
        ))
    })?;
    current
        .checked_add(delta)
        .ok_or_else(|| error::invalid_metadata(format!("metadata entry {key} would overflow")))
}

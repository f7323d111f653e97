/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use bytes::Bytes;

use super::{ensure_bucket, failed};
use crate::client::Handle;
use crate::connection::SharedStore;
use crate::error::Error;
use crate::key::{self, StorageLocation};
use crate::types::ContainerTags;

/// Operation struct for reading container tags
#[derive(Clone, Default, Debug)]
pub(crate) struct GetTags;

impl GetTags {
    /// Tags of `container`, empty when none were ever set.
    #[tracing::instrument(skip_all, level = "debug", name = "get-tags", fields(container = container))]
    pub(crate) async fn orchestrate(
        handle: &Handle,
        account: &str,
        container: &str,
    ) -> Result<ContainerTags, Error> {
        let location = key::tags_location(account, container, handle.config.addressing_mode());
        get_tags(handle, &location)
            .await
            .map_err(|err| failed("getTags", container, err))
    }
}

async fn get_tags(handle: &Handle, location: &StorageLocation) -> Result<ContainerTags, Error> {
    let store = handle.connections.get(location.bucket()).await?;
    Ok(read_marker(&store, location).await?.unwrap_or_default())
}

/// Operation struct for merging tags into a container
#[derive(Clone, Default, Debug)]
pub(crate) struct AddTags;

impl AddTags {
    /// Merge `tags` into the tags of `container`, creating the bucket and the marker object
    /// as needed. Returns `tags` as given.
    #[tracing::instrument(skip_all, level = "debug", name = "add-tags", fields(container = container))]
    pub(crate) async fn orchestrate(
        handle: &Handle,
        account: &str,
        container: &str,
        tags: ContainerTags,
    ) -> Result<ContainerTags, Error> {
        let location = key::tags_location(account, container, handle.config.addressing_mode());
        add_tags(handle, &location, &tags)
            .await
            .map_err(|err| failed("addTags", container, err))?;
        Ok(tags)
    }
}

async fn add_tags(
    handle: &Handle,
    location: &StorageLocation,
    tags: &ContainerTags,
) -> Result<(), Error> {
    let store = handle.connections.get(location.bucket()).await?;
    ensure_bucket(&store, location.bucket()).await?;

    let mut merged = match read_marker(&store, location).await? {
        Some(existing) => existing,
        None => {
            tracing::debug!(
                "creating tag marker {}/{}",
                location.bucket(),
                location.key()
            );
            store
                .put_object(location.bucket(), location.key(), Bytes::new(), None)
                .await?;
            ContainerTags::new()
        }
    };

    merged.extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
    // tagging is a full replace of the tag-set
    store
        .put_object_tagging(location.bucket(), location.key(), &merged)
        .await
}

/// The tag-set of the marker object, or `None` when there is no marker.
async fn read_marker(
    store: &SharedStore,
    location: &StorageLocation,
) -> Result<Option<ContainerTags>, Error> {
    if !store.object_exists(location.bucket(), location.key()).await? {
        return Ok(None);
    }
    let tags = store
        .get_object_tagging(location.bucket(), location.key())
        .await?;
    Ok(Some(tags))
}

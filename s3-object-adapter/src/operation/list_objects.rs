/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use super::failed;
use crate::client::Handle;
use crate::error::Error;
use crate::key;
use crate::store::ListedKey;
use crate::types::{AddressingMode, ListedObject};
use crate::{SEPARATOR, TAGS_MARKER};

/// Operation struct for listing the objects stored for a container
#[derive(Clone, Default, Debug)]
pub(crate) struct ListObjects;

impl ListObjects {
    /// List every object of `container`.
    ///
    /// Returns `None` when the backend has no keys at all for the container, and
    /// `Some` (possibly empty) when keys were found, even if none of them decoded.
    #[tracing::instrument(skip_all, level = "debug", name = "list-objects", fields(container = container))]
    pub(crate) async fn orchestrate(
        handle: &Handle,
        account: &str,
        container: &str,
    ) -> Result<Option<Vec<ListedObject>>, Error> {
        let mode = handle.config.addressing_mode();
        let keys = list_keys(handle, account, container, mode)
            .await
            .map_err(|err| failed("getAllObjects", container, err))?;
        if keys.is_empty() {
            return Ok(None);
        }

        tracing::debug!("decoding {} keys", keys.len());
        let objects = keys
            .iter()
            .filter_map(|listed| decode(listed, mode))
            .collect();
        Ok(Some(objects))
    }
}

async fn list_keys(
    handle: &Handle,
    account: &str,
    container: &str,
    mode: AddressingMode,
) -> Result<Vec<ListedKey>, Error> {
    let bucket = key::bucket_name(account, container, mode);
    // a container that owns its bucket is listed whole
    let prefix = match mode {
        AddressingMode::AccountAsBucket => key::container_prefix(container),
        AddressingMode::ContainerAsBucket => String::new(),
    };
    let store = handle.connections.get(bucket).await?;
    store.list_objects(bucket, &prefix).await
}

/// Recover the logical path of a listed key, skipping the tag marker.
fn decode(listed: &ListedKey, mode: AddressingMode) -> Option<ListedObject> {
    let mut segments: Vec<&str> = listed
        .key()
        .split(SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.last() == Some(&TAGS_MARKER) {
        return None;
    }
    if mode.is_account_as_bucket() && !segments.is_empty() {
        segments.remove(0);
    }

    let decoded = ListedObject::from_segments(&segments, listed.last_modified());
    if decoded.is_none() {
        tracing::debug!(
            "ignoring key {} with {} path segments",
            listed.key(),
            segments.len()
        );
    }
    decoded
}

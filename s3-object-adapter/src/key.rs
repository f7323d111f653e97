/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::types::{AddressingMode, ObjectIdentity};
use crate::{SEPARATOR, TAGS_MARKER};

/// The physical bucket/key pair a logical identity maps onto.
///
/// Locations are recomputed for every call and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocation {
    bucket: String,
    key: String,
}

impl StorageLocation {
    pub(crate) fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// The bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The object key within the bucket.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Resolve the bucket and object key for `id`.
///
/// * [`AddressingMode::AccountAsBucket`]: the bucket is the account and the key is
///   `container/source/process/object_name`.
/// * [`AddressingMode::ContainerAsBucket`]: the bucket is the container and the key is
///   `source/process/object_name`.
///
/// Absent or empty segments are skipped.
pub fn resolve(id: &ObjectIdentity, mode: AddressingMode) -> StorageLocation {
    debug_assert!(!id.object_name().is_empty(), "object name must not be empty");
    let key = match mode {
        AddressingMode::AccountAsBucket => join_segments([
            Some(id.container()),
            id.source(),
            id.process(),
            Some(id.object_name()),
        ]),
        AddressingMode::ContainerAsBucket => {
            join_segments([id.source(), id.process(), Some(id.object_name())])
        }
    };
    StorageLocation::new(bucket_name(id.account(), id.container(), mode), key)
}

/// The bucket holding everything stored for `container`.
pub fn bucket_name<'a>(account: &'a str, container: &'a str, mode: AddressingMode) -> &'a str {
    match mode {
        AddressingMode::AccountAsBucket => account,
        AddressingMode::ContainerAsBucket => container,
    }
}

/// Location of the marker object that carries the tags of `container`.
pub fn tags_location(account: &str, container: &str, mode: AddressingMode) -> StorageLocation {
    let key = match mode {
        AddressingMode::AccountAsBucket => join_segments([Some(container), Some(TAGS_MARKER)]),
        AddressingMode::ContainerAsBucket => TAGS_MARKER.to_owned(),
    };
    StorageLocation::new(bucket_name(account, container, mode), key)
}

/// The key prefix searched when listing `container`.
pub(crate) fn container_prefix(container: &str) -> String {
    format!("{container}{SEPARATOR}")
}

fn join_segments<'a>(segments: impl IntoIterator<Item = Option<&'a str>>) -> String {
    segments
        .into_iter()
        .flatten()
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_sdk_s3::error::DisplayErrorContext;

use crate::connection::SharedStore;
use crate::error::{self, Error};

/// Single object reads, writes and deletes
pub(crate) mod object;

/// User metadata read-merge-write
pub(crate) mod metadata;

/// Container tags kept on the tag marker object
pub(crate) mod tags;

/// Listing the objects stored for a container
pub(crate) mod list_objects;

/// Create `bucket` if the backend does not know it yet.
pub(crate) async fn ensure_bucket(store: &SharedStore, bucket: &str) -> Result<(), Error> {
    if !store.bucket_exists(bucket).await? {
        tracing::debug!("bucket {bucket} does not exist, creating it");
        store.create_bucket(bucket).await?;
    }
    Ok(())
}

/// Log a failed operation against `container` and surface it as
/// [`ErrorKind::ObjectStoreUnavailable`](crate::error::ErrorKind::ObjectStoreUnavailable).
pub(crate) fn failed(operation: &str, container: &str, err: Error) -> Error {
    tracing::error!(
        "{operation} failed for {container}: {}",
        DisplayErrorContext(&err)
    );
    error::unavailable(err)
}

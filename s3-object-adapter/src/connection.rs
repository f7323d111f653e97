/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;

use crate::error::{Error, ErrorKind};
use crate::store::ObjectStore;

/// Builds [`ObjectStore`] connections from the adapter configuration
pub mod s3;

pub use s3::S3Connector;

/// A connection to the object store that can be shared between operations.
pub type SharedStore = Arc<dyn ObjectStore>;

/// Creates new connections to the object store.
///
/// A connector only constructs the client; the [`ConnectionManager`] validates it before use.
#[async_trait]
pub trait Connector: Send + Sync + fmt::Debug {
    /// Build a new, not yet validated, connection.
    async fn connect(&self) -> Result<SharedStore, Error>;
}

/// Observable state of a [`ConnectionManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection has been created yet.
    Unset,
    /// A connection passed its last probe.
    Valid,
    /// The last attempt to obtain a connection ran out of retries.
    Invalid,
}

#[derive(Debug, Clone)]
enum Slot {
    Unset,
    Valid(SharedStore),
    Invalid,
}

/// Owns the single connection shared by every adapter operation.
///
/// The connection is created lazily and probed with a bucket-exists query every time it is
/// handed out. When the probe fails a new connection is built and probed, retrying up to the
/// configured maximum before giving up with [`ErrorKind::ObjectStoreUnavailable`].
///
/// Replacing the connection is a single swap of a fully constructed handle. Callers racing
/// on a stale connection may each rebuild one; the last one installed wins.
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    slot: RwLock<Slot>,
    retries: AtomicU32,
    max_retries: u32,
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connector", &self.connector)
            .field("state", &self.state())
            .field("retries", &self.retry_count())
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl ConnectionManager {
    /// Create a manager that builds connections with `connector`.
    pub fn new(connector: Arc<dyn Connector>, max_retries: u32) -> Self {
        Self {
            connector,
            slot: RwLock::new(Slot::Unset),
            retries: AtomicU32::new(0),
            max_retries,
        }
    }

    /// The current state of the managed connection.
    pub fn state(&self) -> ConnectionState {
        match &*self.slot.read().unwrap_or_else(PoisonError::into_inner) {
            Slot::Unset => ConnectionState::Unset,
            Slot::Valid(_) => ConnectionState::Valid,
            Slot::Invalid => ConnectionState::Invalid,
        }
    }

    /// Number of failed rebuilds, across all callers, since the last successful one.
    ///
    /// Only reported; each call to [`get`](Self::get) keeps its own retry budget.
    pub fn retry_count(&self) -> u32 {
        self.retries.load(Ordering::SeqCst)
    }

    /// Returns a connection that just answered a probe against `bucket`.
    ///
    /// Each call may rebuild the connection at most `max_retries` times after the first
    /// failed attempt, independently of other callers.
    pub async fn get(&self, bucket: &str) -> Result<SharedStore, Error> {
        let stale = self.current();
        if let Some(store) = &stale {
            match store.bucket_exists(bucket).await {
                Ok(_) => return Ok(store.clone()),
                Err(err) => tracing::warn!(
                    "existing connection failed for {bucket}, creating a new one (retry count: {}): {}",
                    self.retry_count(),
                    DisplayErrorContext(&err)
                ),
            }
        }

        let mut retry = 0;
        loop {
            match self.rebuild(bucket).await {
                Ok(store) => {
                    self.retries.store(0, Ordering::SeqCst);
                    self.install(Slot::Valid(store.clone()));
                    return Ok(store);
                }
                Err(err) => {
                    if retry >= self.max_retries {
                        tracing::error!(
                            "maximum retry limit exceeded, could not obtain connection for {bucket} (retry count: {retry}): {}",
                            DisplayErrorContext(&err)
                        );
                        self.retries.store(0, Ordering::SeqCst);
                        self.invalidate(stale.as_ref());
                        return Err(Error::new(ErrorKind::ObjectStoreUnavailable, err));
                    }
                    retry += 1;
                    self.retries.fetch_add(1, Ordering::SeqCst);
                    tracing::warn!(
                        "failed to obtain connection for {bucket}, will try again (retry count: {retry}): {}",
                        DisplayErrorContext(&err)
                    );
                }
            }
        }
    }

    fn current(&self) -> Option<SharedStore> {
        match &*self.slot.read().unwrap_or_else(PoisonError::into_inner) {
            Slot::Valid(store) => Some(store.clone()),
            _ => None,
        }
    }

    fn install(&self, slot: Slot) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = slot;
    }

    /// Mark the connection invalid unless another caller installed a new one since `failed`
    /// was handed out.
    fn invalidate(&self, failed: Option<&SharedStore>) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        let replaced = match (&*slot, failed) {
            (Slot::Valid(current), Some(failed)) => !Arc::ptr_eq(current, failed),
            (Slot::Valid(_), None) => true,
            _ => false,
        };
        if !replaced {
            *slot = Slot::Invalid;
        }
    }

    async fn rebuild(&self, bucket: &str) -> Result<SharedStore, Error> {
        tracing::debug!("creating new connection for {bucket}");
        let store = self.connector.connect().await?;
        store.bucket_exists(bucket).await?;
        Ok(store)
    }
}

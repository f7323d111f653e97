/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;
use std::time::SystemTime;

/// User-defined key/value metadata attached to a single object.
pub type ObjectMetadata = HashMap<String, String>;

/// Key/value tags attached to a whole container.
pub type ContainerTags = HashMap<String, String>;

/// How logical identities are laid out across buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddressingMode {
    /// Each container is its own bucket and the container name never appears in object keys.
    #[default]
    ContainerAsBucket,

    /// The account is the bucket and the container becomes the leading key segment.
    AccountAsBucket,
}

impl AddressingMode {
    /// Map the `use account as bucket name` configuration flag onto a mode.
    pub fn from_flag(use_account_as_bucket: bool) -> Self {
        if use_account_as_bucket {
            AddressingMode::AccountAsBucket
        } else {
            AddressingMode::ContainerAsBucket
        }
    }

    /// Returns true if the account names the bucket.
    pub fn is_account_as_bucket(&self) -> bool {
        matches!(self, AddressingMode::AccountAsBucket)
    }
}

/// The logical address of an object.
///
/// `source` and `process` are optional intermediate path segments; the object name is
/// mandatory and must not be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectIdentity {
    account: String,
    container: String,
    source: Option<String>,
    process: Option<String>,
    object_name: String,
}

impl ObjectIdentity {
    /// Create an identity with no `source` or `process` segment.
    pub fn new(
        account: impl Into<String>,
        container: impl Into<String>,
        object_name: impl Into<String>,
    ) -> Self {
        Self {
            account: account.into(),
            container: container.into(),
            source: None,
            process: None,
            object_name: object_name.into(),
        }
    }

    /// Set the `source` segment.
    pub fn with_source(self, source: impl Into<String>) -> Self {
        self.set_source(Some(source.into()))
    }

    /// Set or clear the `source` segment.
    pub fn set_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    /// Set the `process` segment.
    pub fn with_process(self, process: impl Into<String>) -> Self {
        self.set_process(Some(process.into()))
    }

    /// Set or clear the `process` segment.
    pub fn set_process(mut self, process: Option<String>) -> Self {
        self.process = process;
        self
    }

    /// The account that owns the container.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// The container the object belongs to.
    pub fn container(&self) -> &str {
        &self.container
    }

    /// The optional `source` segment.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// The optional `process` segment.
    pub fn process(&self) -> Option<&str> {
        self.process.as_deref()
    }

    /// The object name.
    pub fn object_name(&self) -> &str {
        &self.object_name
    }
}

/// An object found by [`get_all_objects`](crate::Client::get_all_objects), with the logical
/// path segments recovered from its storage key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedObject {
    source: Option<String>,
    process: Option<String>,
    object_name: String,
    last_modified: Option<SystemTime>,
}

impl ListedObject {
    /// Decode the path segments that follow the container prefix.
    ///
    /// The arity is fixed:
    ///
    /// | segments | decoded as                          |
    /// |----------|-------------------------------------|
    /// | 1        | `object_name`                       |
    /// | 2        | `source`, `object_name`             |
    /// | 3        | `source`, `process`, `object_name`  |
    ///
    /// Any other number of segments has no logical meaning and yields `None`.
    pub fn from_segments(segments: &[&str], last_modified: Option<SystemTime>) -> Option<Self> {
        let (source, process, object_name) = match *segments {
            [object_name] => (None, None, object_name),
            [source, object_name] => (Some(source), None, object_name),
            [source, process, object_name] => (Some(source), Some(process), object_name),
            _ => return None,
        };
        Some(Self {
            source: source.map(str::to_owned),
            process: process.map(str::to_owned),
            object_name: object_name.to_owned(),
            last_modified,
        })
    }

    /// The `source` segment, if the key had one.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// The `process` segment, if the key had one.
    pub fn process(&self) -> Option<&str> {
        self.process.as_deref()
    }

    /// The object name.
    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    /// When the backend last modified the object.
    pub fn last_modified(&self) -> Option<SystemTime> {
        self.last_modified
    }
}

/// The result of an operation that may not be applicable to this backend.
///
/// `Unsupported` is not a failure and must not be retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The operation ran to completion.
    Completed(T),

    /// The backend does not implement this operation.
    Unsupported,
}

impl<T> Outcome<T> {
    /// Returns true if the operation ran. This is the boolean exposed by adapters that
    /// report unsupported operations as `false`.
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    /// Returns the completed value, if any.
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Unsupported => None,
        }
    }
}

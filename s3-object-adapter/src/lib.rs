/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/* Automatically managed default lints */
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
/* End of automatically managed default lints */
#![warn(
    missing_debug_implementations,
    missing_docs,
    rustdoc::missing_crate_level_docs,
    unreachable_pub,
    rust_2018_idioms
)]

//! A logical object store on top of Amazon S3 and S3-compatible storage.
//!
//! Objects are addressed by an [`ObjectIdentity`](crate::types::ObjectIdentity)
//! (`account`, `container`, optional `source` and `process` segments, and an
//! object name) rather than by bucket and key. The adapter resolves each identity
//! to a bucket/key pair, keeps a single validated connection to the backend, and
//! layers read-merge-write semantics for user metadata and container tags on top
//! of the plain S3 API.
//!
//! # Examples
//!
//! Load the configuration from the environment and store an object:
//!
//! ```no_run
//! # async fn example() -> Result<(), s3_object_adapter::error::Error> {
//! use s3_object_adapter::types::ObjectIdentity;
//!
//! let config = s3_object_adapter::from_env().load()?;
//! let client = s3_object_adapter::Client::new(config);
//!
//! let id = ObjectIdentity::new("registration", "10001100010002", "packet.zip")
//!     .with_source("REGISTRATION_CLIENT")
//!     .with_process("NEW");
//!
//! client.put_object(&id, "hello").await?;
//! let mut metadata = std::collections::HashMap::new();
//! metadata.insert("status".to_string(), "uploaded".to_string());
//! client.add_object_metadata(&id, metadata).await?;
//! # Ok(())
//! # }
//! ```
//!
//! See the documentation for each client operation for more information:
//!
//! * [`get_object`](crate::Client::get_object) / [`put_object`](crate::Client::put_object) - read or write an object body
//! * [`add_object_metadata`](crate::Client::add_object_metadata) - merge user metadata onto an object
//! * [`add_tags`](crate::Client::add_tags) - merge tags onto a container
//! * [`get_all_objects`](crate::Client::get_all_objects) - list the objects stored under a container

/// Name of the reserved object that carries container-level tags.
pub const TAGS_MARKER: &str = "tags";

/// Separator between the segments of an object key.
pub(crate) const SEPARATOR: &str = "/";

/// Error types emitted by `s3-object-adapter`
pub mod error;

/// Common types used by `s3-object-adapter`
pub mod types;

/// Mapping of logical identities onto buckets and keys
pub mod key;

/// The object store capability and its S3 implementation
pub mod store;

/// Connection lifecycle management
pub mod connection;

/// Object store adapter client
pub mod client;

/// Adapter operations
pub(crate) mod operation;

/// Adapter configuration
pub mod config;

pub use self::client::Client;
use self::config::loader::ConfigLoader;
pub use self::config::Config;

/// Create a config loader
pub fn from_env() -> ConfigLoader {
    ConfigLoader::default()
}

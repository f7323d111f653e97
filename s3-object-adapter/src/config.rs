/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::sync::Arc;

use crate::connection::{Connector, S3Connector};
use crate::types::AddressingMode;

/// Load configuration from the environment
pub mod loader;

/// Default region used when none is configured
pub(crate) const DEFAULT_REGION: &str = "us-east-1";

/// Default size, in bytes, of the buffer that lets a rewritten upload be retried
pub(crate) const DEFAULT_READ_LIMIT: u64 = 10_000_000;

/// Default number of connection retries
pub(crate) const DEFAULT_MAX_RETRIES: u32 = 20;

/// Default size of the connection pool
pub(crate) const DEFAULT_MAX_CONNECTIONS: usize = 200;

/// Configuration for a [`Client`](crate::client::Client)
#[derive(Clone)]
pub struct Config {
    access_key: Option<String>,
    secret_key: Option<String>,
    endpoint_url: Option<String>,
    region: String,
    read_limit: u64,
    max_retries: u32,
    max_connections: usize,
    addressing_mode: AddressingMode,
    connector: Arc<dyn Connector>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "** redacted **"))
            .field("endpoint_url", &self.endpoint_url)
            .field("region", &self.region)
            .field("read_limit", &self.read_limit)
            .field("max_retries", &self.max_retries)
            .field("max_connections", &self.max_connections)
            .field("addressing_mode", &self.addressing_mode)
            .field("connector", &self.connector)
            .finish()
    }
}

impl Config {
    /// Create a new `Config` builder
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// The static access key, if one is configured
    pub fn access_key(&self) -> Option<&str> {
        self.access_key.as_deref()
    }

    /// The custom endpoint requests are sent to, if one is configured
    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint_url.as_deref()
    }

    /// The signing region
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Size, in bytes, of the buffer that lets the upload of a metadata rewrite be retried
    pub fn read_limit(&self) -> u64 {
        self.read_limit
    }

    /// Number of times a failed connection is rebuilt before giving up.
    ///
    /// The same limit is applied to the SDK's retries of individual requests.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Maximum number of requests in flight at once
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// How identities are laid out across buckets
    pub fn addressing_mode(&self) -> AddressingMode {
        self.addressing_mode
    }

    /// The connector used to (re)build connections to the object store
    pub fn connector(&self) -> &Arc<dyn Connector> {
        &self.connector
    }
}

/// Fluent style builder for [Config]
#[derive(Clone, Default)]
pub struct Builder {
    access_key: Option<String>,
    secret_key: Option<String>,
    endpoint_url: Option<String>,
    region: Option<String>,
    read_limit: Option<u64>,
    max_retries: Option<u32>,
    max_connections: Option<usize>,
    addressing_mode: Option<AddressingMode>,
    connector: Option<Arc<dyn Connector>>,
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "** redacted **"))
            .field("endpoint_url", &self.endpoint_url)
            .field("region", &self.region)
            .field("read_limit", &self.read_limit)
            .field("max_retries", &self.max_retries)
            .field("max_connections", &self.max_connections)
            .field("addressing_mode", &self.addressing_mode)
            .field("connector", &self.connector)
            .finish()
    }
}

impl Builder {
    /// Static credentials used to sign requests.
    ///
    /// When not set, credentials are resolved through the default AWS credentials chain.
    pub fn credentials(mut self, access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    /// Send requests to a custom, S3-compatible endpoint.
    pub fn endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// The signing region. Default is `us-east-1`.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Size, in bytes, of the buffer that lets the upload of a metadata rewrite be retried.
    ///
    /// Rewritten bodies are held in memory and can be replayed in full, so objects larger
    /// than this are still rewritten. Default is 10,000,000 bytes.
    pub fn read_limit(mut self, read_limit: u64) -> Self {
        self.read_limit = Some(read_limit);
        self
    }

    /// Number of times a failed connection is rebuilt before giving up. Default is 20.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Maximum number of requests in flight at once. Default is 200.
    pub fn max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = Some(max_connections);
        self
    }

    /// Name buckets after the account instead of the container. Default is `false`.
    pub fn use_account_as_bucket_name(self, use_account_as_bucket: bool) -> Self {
        self.addressing_mode(AddressingMode::from_flag(use_account_as_bucket))
    }

    /// How identities are laid out across buckets.
    pub fn addressing_mode(mut self, mode: AddressingMode) -> Self {
        self.addressing_mode = Some(mode);
        self
    }

    /// Set an explicit connector to build connections with.
    ///
    /// When set, the credentials, endpoint, region and connection pool settings of this
    /// builder are not used to build connections.
    pub fn connector(mut self, connector: impl Connector + 'static) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Fill every setting not present on `self` from `fallback`.
    pub(crate) fn or(self, fallback: Builder) -> Self {
        let (access_key, secret_key) = match (self.access_key, self.secret_key) {
            (Some(access_key), Some(secret_key)) => (Some(access_key), Some(secret_key)),
            _ => (fallback.access_key, fallback.secret_key),
        };
        Builder {
            access_key,
            secret_key,
            endpoint_url: self.endpoint_url.or(fallback.endpoint_url),
            region: self.region.or(fallback.region),
            read_limit: self.read_limit.or(fallback.read_limit),
            max_retries: self.max_retries.or(fallback.max_retries),
            max_connections: self.max_connections.or(fallback.max_connections),
            addressing_mode: self.addressing_mode.or(fallback.addressing_mode),
            connector: self.connector.or(fallback.connector),
        }
    }

    /// Consumes the builder and constructs a [`Config`](crate::config::Config)
    pub fn build(self) -> Config {
        let region = self.region.unwrap_or_else(|| DEFAULT_REGION.to_owned());
        let max_retries = self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES);
        let max_connections = self
            .max_connections
            .unwrap_or(DEFAULT_MAX_CONNECTIONS)
            .max(1);

        let connector = match self.connector {
            Some(connector) => connector,
            None => {
                let mut connector = S3Connector::new(region.clone())
                    .max_error_retries(max_retries)
                    .max_connections(max_connections);
                if let (Some(access_key), Some(secret_key)) = (&self.access_key, &self.secret_key) {
                    connector = connector.credentials(access_key, secret_key);
                }
                if let Some(endpoint_url) = &self.endpoint_url {
                    connector = connector.endpoint_url(endpoint_url);
                }
                Arc::new(connector)
            }
        };

        Config {
            access_key: self.access_key,
            secret_key: self.secret_key,
            endpoint_url: self.endpoint_url,
            region,
            read_limit: self.read_limit.unwrap_or(DEFAULT_READ_LIMIT),
            max_retries,
            max_connections,
            addressing_mode: self.addressing_mode.unwrap_or_default(),
            connector,
        }
    }
}

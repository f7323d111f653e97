/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::str::FromStr;

use crate::config::Builder;
use crate::connection::Connector;
use crate::error::{self, Error};
use crate::types::AddressingMode;
use crate::Config;

const ACCESS_KEY: &str = "OBJECT_STORE_S3_ACCESS_KEY";
const SECRET_KEY: &str = "OBJECT_STORE_S3_SECRET_KEY";
const URL: &str = "OBJECT_STORE_S3_URL";
const REGION: &str = "OBJECT_STORE_S3_REGION";
const READ_LIMIT: &str = "OBJECT_STORE_S3_READ_LIMIT";
const MAX_RETRY: &str = "OBJECT_STORE_CONNECTION_MAX_RETRY";
const MAX_CONNECTION: &str = "OBJECT_STORE_MAX_CONNECTION";
const USE_ACCOUNT_AS_BUCKET_NAME: &str = "OBJECT_STORE_S3_USE_ACCOUNT_AS_BUCKET_NAME";

/// Load adapter [`Config`] from the environment.
///
/// | variable                                     | setting                      |
/// |----------------------------------------------|------------------------------|
/// | `OBJECT_STORE_S3_ACCESS_KEY`                 | static access key            |
/// | `OBJECT_STORE_S3_SECRET_KEY`                 | static secret key            |
/// | `OBJECT_STORE_S3_URL`                        | endpoint URL                 |
/// | `OBJECT_STORE_S3_REGION`                     | region                       |
/// | `OBJECT_STORE_S3_READ_LIMIT`                 | read limit in bytes          |
/// | `OBJECT_STORE_CONNECTION_MAX_RETRY`          | connection retries           |
/// | `OBJECT_STORE_MAX_CONNECTION`                | connection pool size         |
/// | `OBJECT_STORE_S3_USE_ACCOUNT_AS_BUCKET_NAME` | `true` to name buckets after the account |
///
/// Values set on the loader take precedence over the environment.
#[derive(Default, Debug)]
pub struct ConfigLoader {
    builder: Builder,
}

impl ConfigLoader {
    /// Static credentials used to sign requests.
    pub fn credentials(mut self, access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        self.builder = self.builder.credentials(access_key, secret_key);
        self
    }

    /// Send requests to a custom, S3-compatible endpoint.
    pub fn endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.builder = self.builder.endpoint_url(endpoint_url);
        self
    }

    /// The signing region.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.builder = self.builder.region(region);
        self
    }

    /// Largest object body, in bytes, that will be buffered to rewrite its metadata.
    pub fn read_limit(mut self, read_limit: u64) -> Self {
        self.builder = self.builder.read_limit(read_limit);
        self
    }

    /// Number of times a failed connection is rebuilt before giving up.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.builder = self.builder.max_retries(max_retries);
        self
    }

    /// Maximum number of requests in flight at once.
    pub fn max_connections(mut self, max_connections: usize) -> Self {
        self.builder = self.builder.max_connections(max_connections);
        self
    }

    /// How identities are laid out across buckets.
    pub fn addressing_mode(mut self, mode: AddressingMode) -> Self {
        self.builder = self.builder.addressing_mode(mode);
        self
    }

    /// Set an explicit connector to build connections with.
    pub fn connector(mut self, connector: impl Connector + 'static) -> Self {
        self.builder = self.builder.connector(connector);
        self
    }

    /// Load the configuration
    ///
    /// If fields have been overridden during loader construction, the override values will be
    /// used. Otherwise, values are read from the environment, falling back to the defaults.
    pub fn load(self) -> Result<Config, Error> {
        self.load_with(|name| std::env::var(name).ok())
    }

    pub(crate) fn load_with(
        self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Config, Error> {
        let mut env = Builder::default();
        if let (Some(access_key), Some(secret_key)) = (lookup(ACCESS_KEY), lookup(SECRET_KEY)) {
            env = env.credentials(access_key, secret_key);
        }
        if let Some(url) = lookup(URL) {
            env = env.endpoint_url(url);
        }
        if let Some(region) = lookup(REGION) {
            env = env.region(region);
        }
        if let Some(read_limit) = parse(&lookup, READ_LIMIT)? {
            env = env.read_limit(read_limit);
        }
        if let Some(max_retries) = parse(&lookup, MAX_RETRY)? {
            env = env.max_retries(max_retries);
        }
        if let Some(max_connections) = parse(&lookup, MAX_CONNECTION)? {
            env = env.max_connections(max_connections);
        }
        if let Some(flag) = parse::<bool>(&lookup, USE_ACCOUNT_AS_BUCKET_NAME)? {
            env = env.use_account_as_bucket_name(flag);
        }

        let config = self.builder.or(env).build();
        tracing::debug!("loaded object store configuration: {config:?}");
        Ok(config)
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|err| error::invalid_input(format!("invalid value for {name}: {err}")))
        })
        .transpose()
}

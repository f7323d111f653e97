/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::cmp;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{Credentials, Region};
use tokio::sync::Semaphore;

use super::{Connector, SharedStore};
use crate::error::Error;
use crate::store::S3Store;

/// Name reported by the static credentials provider.
const CREDENTIALS_PROVIDER_NAME: &str = "s3-object-adapter";

/// Builds [`S3Store`] connections.
///
/// Every connection uses path-style addressing, so the connector works with S3-compatible
/// stores (MinIO, Ceph, ...) addressed through a custom endpoint. Connections built by the
/// same connector share one pool of request permits.
#[derive(Clone)]
pub struct S3Connector {
    access_key: Option<String>,
    secret_key: Option<String>,
    endpoint_url: Option<String>,
    region: String,
    max_error_retries: u32,
    max_connections: usize,
    permits: Arc<Semaphore>,
}

impl fmt::Debug for S3Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Connector")
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "** redacted **"))
            .field("endpoint_url", &self.endpoint_url)
            .field("region", &self.region)
            .field("max_error_retries", &self.max_error_retries)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl S3Connector {
    /// Create a connector for `region` that resolves credentials from the environment.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            access_key: None,
            secret_key: None,
            endpoint_url: None,
            region: region.into(),
            max_error_retries: 0,
            max_connections: Semaphore::MAX_PERMITS,
            permits: Arc::new(Semaphore::new(Semaphore::MAX_PERMITS)),
        }
    }

    /// Use a static access key / secret key pair instead of the default credentials chain.
    pub fn credentials(mut self, access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    /// Send requests to a custom endpoint.
    pub fn endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Number of times the SDK retries a failed request before reporting the error.
    pub fn max_error_retries(mut self, retries: u32) -> Self {
        self.max_error_retries = retries;
        self
    }

    /// Maximum number of requests in flight at once. Values below 1 are rounded up.
    pub fn max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = cmp::min(cmp::max(max_connections, 1), Semaphore::MAX_PERMITS);
        self.permits = Arc::new(Semaphore::new(self.max_connections));
        self
    }

    fn static_credentials(&self) -> Option<Credentials> {
        match (&self.access_key, &self.secret_key) {
            (Some(access_key), Some(secret_key)) => Some(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                CREDENTIALS_PROVIDER_NAME,
            )),
            _ => None,
        }
    }

    /// Apply the connection settings on top of `builder`.
    pub(crate) fn configure(&self, builder: aws_sdk_s3::config::Builder) -> aws_sdk_s3::config::Builder {
        let mut builder = builder
            .region(Region::new(self.region.clone()))
            .force_path_style(true)
            .retry_config(
                RetryConfig::standard().with_max_attempts(self.max_error_retries.saturating_add(1)),
            );
        builder.set_endpoint_url(self.endpoint_url.clone());
        match self.static_credentials() {
            Some(credentials) => builder.credentials_provider(credentials),
            None => builder,
        }
    }
}

#[async_trait]
impl Connector for S3Connector {
    async fn connect(&self) -> Result<SharedStore, Error> {
        let builder = match self.static_credentials() {
            Some(_) => aws_sdk_s3::config::Builder::new().behavior_version(BehaviorVersion::latest()),
            None => {
                let shared_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
                aws_sdk_s3::config::Builder::from(&shared_config)
            }
        };
        let client = aws_sdk_s3::Client::from_conf(self.configure(builder).build());
        Ok(Arc::new(S3Store::with_permits(client, self.permits.clone())))
    }
}

#[cfg(test)]
mod tests {
    use aws_config::BehaviorVersion;

    use super::S3Connector;

    #[test]
    fn test_configure() {
        let connector = S3Connector::new("eu-west-1")
            .credentials("access", "secret")
            .endpoint_url("http://localhost:9000")
            .max_error_retries(4);
        let config = connector
            .configure(aws_sdk_s3::config::Builder::new().behavior_version(BehaviorVersion::latest()))
            .build();

        assert_eq!(Some("eu-west-1"), config.region().map(|r| r.as_ref()));
        assert_eq!(
            5,
            config.retry_config().map(|r| r.max_attempts()).unwrap()
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let connector = S3Connector::new("us-east-1").credentials("access", "top-secret");
        let rendered = format!("{connector:?}");
        assert!(rendered.contains("access"));
        assert!(!rendered.contains("top-secret"));
    }

    #[test]
    fn test_max_connections_rounds_up() {
        let connector = S3Connector::new("us-east-1").max_connections(0);
        assert_eq!(1, connector.permits.available_permits());
    }

    #[test]
    fn test_debug_reports_configured_max_connections() {
        let connector = S3Connector::new("us-east-1").max_connections(3);
        let _permit = connector.permits.try_acquire().unwrap();
        assert_eq!(2, connector.permits.available_permits());
        assert!(format!("{connector:?}").contains("max_connections: 3"));
    }

    #[tokio::test]
    async fn test_connect_with_static_credentials() {
        use super::Connector;

        let connector = S3Connector::new("us-east-1")
            .credentials("access", "secret")
            .endpoint_url("http://localhost:9000");
        // building a client never talks to the endpoint
        assert!(connector.connect().await.is_ok());
    }
}

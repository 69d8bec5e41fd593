//! S3 storage backend implemented on the AWS SDK
//!
//! This module builds an `aws_sdk_s3::Client` from a [`ServerConfig`] and
//! wraps it in [`S3StorageClient`], which implements the `StorageClient`
//! port. Signing, transport and retries are left to the SDK.

pub mod s3_adapter;

pub use s3_adapter::S3StorageClient;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use std::sync::Arc;
use tracing::info;

use crate::{
    domain::{
        config::{ServerConfig, DEFAULT_REGION},
        errors::StorageResult,
    },
    ports::storage::{ClientConnector, StorageClient},
};

/// Name reported by the static credentials provider
const CREDENTIALS_PROVIDER_NAME: &str = "object-store-adapter";

/// Create an SDK client from configuration
pub fn create_s3_client(config: &ServerConfig) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        config.access_key(),
        config.secret_key(),
        None, // session token
        None, // expiration
        CREDENTIALS_PROVIDER_NAME,
    );

    let mut builder = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(config.region_or_default().to_string()))
        .credentials_provider(credentials);

    // Non-AWS providers are addressed directly and path-style
    if !config.is_default_provider() {
        builder = builder
            .endpoint_url(config.endpoint_url())
            .force_path_style(true);
    }

    aws_sdk_s3::Client::from_conf(builder.build())
}

/// Location constraint to send with `CreateBucket`, if any.
///
/// `us-east-1` is the implicit default and must not be sent explicitly.
pub fn location_constraint(config: &ServerConfig) -> Option<String> {
    config
        .region()
        .map(str::trim)
        .filter(|region| !region.is_empty() && *region != DEFAULT_REGION)
        .map(str::to_string)
}

/// Connector producing [`S3StorageClient`]s
#[derive(Debug, Clone, Default)]
pub struct S3Connector;

impl S3Connector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ClientConnector for S3Connector {
    async fn connect(&self, config: &ServerConfig) -> StorageResult<Arc<dyn StorageClient>> {
        info!(
            endpoint = config.endpoint(),
            region = config.region_or_default(),
            "Creating S3 client"
        );

        let client = S3StorageClient::new(create_s3_client(config), location_constraint(config));

        Ok(Arc::new(client))
    }
}

use chrono::{SubsecRound, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::{
    adapters::outbound::storage::S3Connector,
    domain::{
        config::ServerConfig,
        errors::{StorageError, StorageResult},
        models::{
            presign_expiry, CorsRule, ObjectDownload, ObjectSource, PresignedUrl,
            ResponseOverrides,
        },
    },
    ports::storage::{ClientConnector, StorageClient},
};

/// Resource name reported by the uninitialized guard
const CLIENT_RESOURCE: &str = "storage client";

/// Adapter exposing bucket and object operations on one S3-compatible
/// endpoint.
///
/// The underlying client is created lazily by [`connect`](Self::connect) and
/// reused for the adapter's lifetime. Every other operation fails with
/// [`StorageError::Uninitialized`] until then, without touching the network.
pub struct ObjectStoreAdapter {
    config: ServerConfig,
    connector: Arc<dyn ClientConnector>,
    client: OnceCell<Arc<dyn StorageClient>>,
}

impl ObjectStoreAdapter {
    /// Create an adapter backed by the S3 SDK
    pub fn new(config: ServerConfig) -> StorageResult<Self> {
        Self::with_connector(config, Arc::new(S3Connector::new()))
    }

    /// Create an adapter that builds its client through `connector`
    pub fn with_connector(
        config: ServerConfig,
        connector: Arc<dyn ClientConnector>,
    ) -> StorageResult<Self> {
        config.validate()?;

        Ok(Self {
            config,
            connector,
            client: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Whether `connect` has completed successfully
    pub fn is_connected(&self) -> bool {
        self.client.initialized()
    }

    /// Establish the client handle.
    ///
    /// Idempotent: once a client exists this is a no-op. Concurrent first
    /// calls wait on the same initialization, so exactly one client is
    /// created. A failed attempt leaves the adapter unconnected.
    pub async fn connect(&self) -> StorageResult<()> {
        if self.client.initialized() {
            debug!("Storage client already connected");
            return Ok(());
        }

        self.client
            .get_or_try_init(|| self.connector.connect(&self.config))
            .await?;

        info!(endpoint = self.config.endpoint(), "Connected to object store");
        Ok(())
    }

    fn client(&self) -> StorageResult<&Arc<dyn StorageClient>> {
        self.client.get().ok_or(StorageError::Uninitialized {
            resource: CLIENT_RESOURCE,
        })
    }

    pub async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool> {
        let client = self.client()?;
        debug!(bucket, "Checking bucket existence");
        client.bucket_exists(bucket).await
    }

    pub async fn make_bucket(&self, bucket: &str) -> StorageResult<()> {
        let client = self.client()?;
        debug!(bucket, "Creating bucket");
        client.create_bucket(bucket).await
    }

    pub async fn remove_bucket(&self, bucket: &str) -> StorageResult<()> {
        let client = self.client()?;
        debug!(bucket, "Removing bucket");
        client.delete_bucket(bucket).await
    }

    /// Replace the bucket's CORS configuration with a single rule allowing
    /// `PUT` with any header from `allowed_origin`, or from any origin when
    /// `None`.
    ///
    /// Existing rules are dropped, not merged; concurrent callers race and
    /// the last writer wins.
    pub async fn set_cors_rule(
        &self,
        bucket: &str,
        allowed_origin: Option<&str>,
    ) -> StorageResult<()> {
        let client = self.client()?;
        let rule = CorsRule::put_from_origin(allowed_origin);
        debug!(bucket, origins = ?rule.allowed_origins, "Setting CORS rule");

        client.delete_bucket_cors(bucket).await?;
        client.put_bucket_cors(bucket, vec![rule]).await
    }

    /// CORS rules currently installed on the bucket
    pub async fn retrieve_cors_rule(&self, bucket: &str) -> StorageResult<Vec<CorsRule>> {
        let client = self.client()?;
        debug!(bucket, "Retrieving CORS rules");
        client.get_bucket_cors(bucket).await
    }

    /// Upload an object from a file or a stream of known length
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        source: ObjectSource,
        content_type: &str,
    ) -> StorageResult<()> {
        let client = self.client()?;
        debug!(bucket, key, content_type, source = ?source, "Putting object");
        client.put_object(bucket, key, source, content_type).await
    }

    pub async fn remove_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let client = self.client()?;
        debug!(bucket, key, "Removing object");
        client.delete_object(bucket, key).await
    }

    /// Check for an object by listing at most one key with `key` as prefix.
    ///
    /// A listing is used instead of a metadata lookup because HEAD requests
    /// have reported freshly written objects as missing. Any key starting
    /// with `key` counts as a match.
    pub async fn object_exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        let client = self.client()?;
        debug!(bucket, key, "Checking object existence");

        let keys = client.list_keys(bucket, key, 1).await?;
        Ok(!keys.is_empty())
    }

    /// Open an object for reading; the body is released when the returned
    /// download is dropped
    pub async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectDownload> {
        let client = self.client()?;
        debug!(bucket, key, "Getting object");
        client.get_object(bucket, key).await
    }

    /// Fetch an object and hand its stream to `handler`.
    ///
    /// The download lives until the handler's future completes and is
    /// dropped afterwards, whether or not the handler read it to the end.
    pub async fn consume_object<F, Fut, T>(
        &self,
        bucket: &str,
        key: &str,
        handler: F,
    ) -> StorageResult<T>
    where
        F: FnOnce(ObjectDownload) -> Fut,
        Fut: Future<Output = T>,
    {
        let download = self.get_object(bucket, key).await?;
        Ok(handler(download).await)
    }

    /// Server-side copy between (possibly different) buckets
    pub async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        destination_key: &str,
    ) -> StorageResult<()> {
        let client = self.client()?;
        debug!(
            source_bucket,
            source_key, destination_bucket, destination_key, "Copying object"
        );

        client
            .copy_object(source_bucket, source_key, destination_bucket, destination_key)
            .await
    }

    /// URL allowing an unauthenticated upload until now + `expires_in_secs`
    pub async fn presigned_put_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in_secs: u64,
    ) -> StorageResult<PresignedUrl> {
        let client = self.client()?;
        let signed_at = Utc::now().trunc_subsecs(0);
        let expires_at = presign_expiry(signed_at, expires_in_secs)?;
        debug!(bucket, key, expires_in_secs, "Presigning PUT");

        let url = client
            .presign_put(bucket, key, signed_at, Duration::from_secs(expires_in_secs))
            .await?;

        Ok(PresignedUrl {
            url,
            method: http::Method::PUT,
            expires_at,
        })
    }

    /// URL allowing an unauthenticated download until now +
    /// `expires_in_secs`, optionally overriding response headers
    pub async fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in_secs: u64,
        overrides: Option<&ResponseOverrides>,
    ) -> StorageResult<PresignedUrl> {
        let client = self.client()?;
        let signed_at = Utc::now().trunc_subsecs(0);
        let expires_at = presign_expiry(signed_at, expires_in_secs)?;
        debug!(bucket, key, expires_in_secs, overrides = ?overrides, "Presigning GET");

        let default_overrides = ResponseOverrides::default();
        let overrides = overrides.unwrap_or(&default_overrides);

        let url = client
            .presign_get(
                bucket,
                key,
                signed_at,
                Duration::from_secs(expires_in_secs),
                overrides,
            )
            .await?;

        Ok(PresignedUrl {
            url,
            method: http::Method::GET,
            expires_at,
        })
    }
}

impl std::fmt::Debug for ObjectStoreAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreAdapter")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::storage::InMemoryConnector;

    fn config() -> ServerConfig {
        ServerConfig::new("s3.amazonaws.com", "access", "secret")
    }

    #[test]
    fn test_invalid_endpoint_fails_construction() {
        let config = ServerConfig::new("example.com", "access", "secret");

        let err = ObjectStoreAdapter::new(config).unwrap_err();
        assert!(matches!(err, StorageError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let connector = Arc::new(InMemoryConnector::new());
        let adapter = ObjectStoreAdapter::with_connector(config(), connector.clone()).unwrap();

        assert!(!adapter.is_connected());
        adapter.connect().await.unwrap();
        adapter.connect().await.unwrap();

        assert!(adapter.is_connected());
        assert_eq!(connector.connections(), 1);
    }

    #[tokio::test]
    async fn test_unrepresentable_expiry_fails_before_signing() {
        let adapter =
            ObjectStoreAdapter::with_connector(config(), Arc::new(InMemoryConnector::new()))
                .unwrap();
        adapter.connect().await.unwrap();

        let err = adapter
            .presigned_put_url("uploads", "a.txt", u64::MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidArgument { .. }));

        let err = adapter
            .presigned_get_url("uploads", "a.txt", i64::MAX as u64 / 1000 + 1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_operations_fail_before_connect() {
        let adapter =
            ObjectStoreAdapter::with_connector(config(), Arc::new(InMemoryConnector::new()))
                .unwrap();

        let err = adapter.bucket_exists("photos").await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Uninitialized {
                resource: CLIENT_RESOURCE
            }
        ));
    }
}

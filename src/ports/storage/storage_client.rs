use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{
    config::ServerConfig,
    errors::StorageResult,
    models::{CorsRule, ObjectDownload, ObjectSource, ResponseOverrides},
};

/// Port for an S3-compatible storage client.
///
/// This is the narrow set of capabilities the adapter forwards to. Every
/// method returns the backend's own error, wrapped in
/// [`StorageError::Backend`](crate::domain::errors::StorageError::Backend).
#[async_trait]
pub trait StorageClient: Send + Sync + 'static {
    /// Check whether a bucket exists
    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool>;

    /// Create a bucket
    async fn create_bucket(&self, bucket: &str) -> StorageResult<()>;

    /// Delete an empty bucket
    async fn delete_bucket(&self, bucket: &str) -> StorageResult<()>;

    /// Fetch the bucket's CORS rules
    async fn get_bucket_cors(&self, bucket: &str) -> StorageResult<Vec<CorsRule>>;

    /// Replace the bucket's CORS configuration with `rules`
    async fn put_bucket_cors(&self, bucket: &str, rules: Vec<CorsRule>) -> StorageResult<()>;

    /// Remove the bucket's CORS configuration
    async fn delete_bucket_cors(&self, bucket: &str) -> StorageResult<()>;

    /// Upload an object, storing `content_type` with it
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        source: ObjectSource,
        content_type: &str,
    ) -> StorageResult<()>;

    /// Open an object for streaming
    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectDownload>;

    /// Delete a single object
    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()>;

    /// Server-side copy
    async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        destination_key: &str,
    ) -> StorageResult<()>;

    /// List up to `max_keys` keys starting with `prefix`
    async fn list_keys(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: usize,
    ) -> StorageResult<Vec<String>>;

    /// Presign an upload, valid from `signed_at` for `expires_in`
    async fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        signed_at: DateTime<Utc>,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Presign a download, valid from `signed_at` for `expires_in`
    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        signed_at: DateTime<Utc>,
        expires_in: Duration,
        overrides: &ResponseOverrides,
    ) -> StorageResult<String>;
}

/// Builds the storage client for a validated configuration
#[async_trait]
pub trait ClientConnector: Send + Sync + 'static {
    async fn connect(&self, config: &ServerConfig) -> StorageResult<Arc<dyn StorageClient>>;
}

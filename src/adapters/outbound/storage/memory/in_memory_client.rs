use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};
use object_store::{
    memory::InMemory,
    path::{Path as ObjectPath, PathPart},
    Attribute, ObjectStore, PutOptions, PutPayload,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::io::StreamReader;

use crate::{
    adapters::outbound::storage::error::{validate_bucket_name, InMemoryError},
    domain::{
        errors::{StorageError, StorageResult},
        models::{CorsRule, ObjectDownload, ObjectSource, ResponseOverrides, MAX_PRESIGN_EXPIRY_SECS},
    },
    ports::storage::StorageClient,
};

/// Endpoint used in presigned URLs when none is configured
pub const IN_MEMORY_ENDPOINT: &str = "memory://in-memory";

/// One `InMemory` store per bucket plus its CORS rules
struct BucketEntry {
    store: Arc<InMemory>,
    cors: Option<Vec<CorsRule>>,
}

impl BucketEntry {
    fn new() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            cors: None,
        }
    }
}

/// In-memory storage client for testing and development
pub struct InMemoryStorageClient {
    endpoint_url: String,
    buckets: RwLock<HashMap<String, BucketEntry>>,
}

impl InMemoryStorageClient {
    pub fn new() -> Self {
        Self::with_endpoint_url(IN_MEMORY_ENDPOINT)
    }

    /// Client whose presigned URLs point at `endpoint_url`
    pub fn with_endpoint_url(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into().trim_end_matches('/').to_string(),
            buckets: RwLock::new(HashMap::new()),
        }
    }

    /// Names of all buckets, sorted
    pub async fn bucket_names(&self) -> Vec<String> {
        let buckets = self.buckets.read().await;
        let mut names: Vec<String> = buckets.keys().cloned().collect();
        names.sort();
        names
    }

    async fn store(&self, operation: &'static str, bucket: &str) -> StorageResult<Arc<InMemory>> {
        let buckets = self.buckets.read().await;
        buckets
            .get(bucket)
            .map(|entry| entry.store.clone())
            .ok_or_else(|| no_such_bucket(operation, bucket))
    }

    fn presigned_url(
        &self,
        operation: &'static str,
        bucket: &str,
        key: &str,
        signed_at: DateTime<Utc>,
        expires_in: Duration,
        extra_params: Vec<(&'static str, String)>,
    ) -> StorageResult<String> {
        let expires_in_secs = expires_in.as_secs();
        if expires_in_secs == 0 || expires_in_secs > MAX_PRESIGN_EXPIRY_SECS {
            return Err(StorageError::backend(
                operation,
                InMemoryError::InvalidExpiry {
                    actual: expires_in_secs,
                    max: MAX_PRESIGN_EXPIRY_SECS,
                },
            ));
        }

        let mut params = vec![
            ("X-Amz-Date", signed_at.format("%Y%m%dT%H%M%SZ").to_string()),
            ("X-Amz-Expires", expires_in_secs.to_string()),
        ];
        params.extend(extra_params);

        let query = params
            .iter()
            .map(|(name, value)| format!("{}={}", name, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        Ok(format!(
            "{}/{}/{}?{}",
            self.endpoint_url,
            bucket,
            encode_key(key),
            query
        ))
    }
}

impl Default for InMemoryStorageClient {
    fn default() -> Self {
        Self::new()
    }
}

fn no_such_bucket(operation: &'static str, bucket: &str) -> StorageError {
    StorageError::backend(
        operation,
        InMemoryError::NoSuchBucket {
            bucket: bucket.to_string(),
        },
    )
}

fn no_such_key(operation: &'static str, bucket: &str, key: &str) -> StorageError {
    StorageError::backend(
        operation,
        InMemoryError::NoSuchKey {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
    )
}

/// Store location of an S3 key.
///
/// The whole key is one encoded path part, so `/`, empty segments and a
/// trailing `/` survive unchanged and distinct keys never share a location.
fn object_path(key: &str) -> ObjectPath {
    ObjectPath::from_iter([PathPart::from(key)])
}

/// S3 key stored at `location`; inverse of [`object_path`]
fn object_key(location: &ObjectPath) -> Result<String, std::string::FromUtf8Error> {
    urlencoding::decode(location.as_ref()).map(|key| key.into_owned())
}

/// Percent-encode each path segment of a key, keeping the separators
fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl StorageClient for InMemoryStorageClient {
    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool> {
        Ok(self.buckets.read().await.contains_key(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> StorageResult<()> {
        validate_bucket_name(bucket).map_err(|e| StorageError::backend("create_bucket", e))?;

        let mut buckets = self.buckets.write().await;
        if buckets.contains_key(bucket) {
            return Err(StorageError::backend(
                "create_bucket",
                InMemoryError::BucketAlreadyExists {
                    bucket: bucket.to_string(),
                },
            ));
        }

        buckets.insert(bucket.to_string(), BucketEntry::new());
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> StorageResult<()> {
        let mut buckets = self.buckets.write().await;

        let entry = buckets
            .get(bucket)
            .ok_or_else(|| no_such_bucket("delete_bucket", bucket))?;

        let first = entry.store.list(None).next().await;
        if first.is_some() {
            return Err(StorageError::backend(
                "delete_bucket",
                InMemoryError::BucketNotEmpty {
                    bucket: bucket.to_string(),
                },
            ));
        }

        buckets.remove(bucket);
        Ok(())
    }

    async fn get_bucket_cors(&self, bucket: &str) -> StorageResult<Vec<CorsRule>> {
        let buckets = self.buckets.read().await;

        let entry = buckets
            .get(bucket)
            .ok_or_else(|| no_such_bucket("get_bucket_cors", bucket))?;

        entry.cors.clone().ok_or_else(|| {
            StorageError::backend(
                "get_bucket_cors",
                InMemoryError::NoSuchCorsConfiguration {
                    bucket: bucket.to_string(),
                },
            )
        })
    }

    async fn put_bucket_cors(&self, bucket: &str, rules: Vec<CorsRule>) -> StorageResult<()> {
        let mut buckets = self.buckets.write().await;

        let entry = buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket("put_bucket_cors", bucket))?;

        entry.cors = Some(rules);
        Ok(())
    }

    async fn delete_bucket_cors(&self, bucket: &str) -> StorageResult<()> {
        let mut buckets = self.buckets.write().await;

        let entry = buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket("delete_bucket_cors", bucket))?;

        entry.cors = None;
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        source: ObjectSource,
        content_type: &str,
    ) -> StorageResult<()> {
        let store = self.store("put_object", bucket).await?;

        let data = source
            .read_to_bytes()
            .await
            .map_err(|e| StorageError::backend("put_object", e))?;

        let mut opts = PutOptions::default();
        opts.attributes
            .insert(Attribute::ContentType, content_type.to_string().into());

        store
            .put_opts(&object_path(key), PutPayload::from(data), opts)
            .await
            .map_err(|e| StorageError::backend("put_object", e))?;

        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectDownload> {
        let store = self.store("get_object", bucket).await?;

        let result = match store.get(&object_path(key)).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => {
                return Err(no_such_key("get_object", bucket, key))
            }
            Err(e) => return Err(StorageError::backend("get_object", e)),
        };

        let content_type = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|value| value.to_string());
        let content_length = Some(result.meta.size);
        let e_tag = result.meta.e_tag.clone();

        let body = StreamReader::new(result.into_stream().map_err(std::io::Error::from));

        Ok(ObjectDownload::new(body)
            .with_content_type(content_type)
            .with_content_length(content_length)
            .with_e_tag(e_tag))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let store = self.store("delete_object", bucket).await?;

        // Deleting a missing key succeeds, as it does on S3
        match store.delete(&object_path(key)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(StorageError::backend("delete_object", e)),
        }
    }

    async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        destination_key: &str,
    ) -> StorageResult<()> {
        let source = self.store("copy_object", source_bucket).await?;
        let destination = self.store("copy_object", destination_bucket).await?;

        let result = match source.get(&object_path(source_key)).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => {
                return Err(no_such_key("copy_object", source_bucket, source_key))
            }
            Err(e) => return Err(StorageError::backend("copy_object", e)),
        };

        let mut opts = PutOptions::default();
        opts.attributes = result.attributes.clone();
        let data = result
            .bytes()
            .await
            .map_err(|e| StorageError::backend("copy_object", e))?;

        destination
            .put_opts(&object_path(destination_key), PutPayload::from(data), opts)
            .await
            .map_err(|e| StorageError::backend("copy_object", e))?;

        Ok(())
    }

    async fn list_keys(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: usize,
    ) -> StorageResult<Vec<String>> {
        let store = self.store("list_objects_v2", bucket).await?;

        let mut keys = Vec::new();
        if max_keys == 0 {
            return Ok(keys);
        }

        // S3 prefixes are plain string prefixes, not path segments
        let mut listing = store.list(None);
        while let Some(meta) = listing.next().await {
            let meta = meta.map_err(|e| StorageError::backend("list_objects_v2", e))?;
            let key = object_key(&meta.location)
                .map_err(|e| StorageError::backend("list_objects_v2", e))?;

            if key.starts_with(prefix) {
                keys.push(key);
                if keys.len() >= max_keys {
                    break;
                }
            }
        }

        Ok(keys)
    }

    async fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        signed_at: DateTime<Utc>,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.presigned_url("presign_put", bucket, key, signed_at, expires_in, Vec::new())
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        signed_at: DateTime<Utc>,
        expires_in: Duration,
        overrides: &ResponseOverrides,
    ) -> StorageResult<String> {
        self.presigned_url(
            "presign_get",
            bucket,
            key,
            signed_at,
            expires_in,
            overrides.query_params(),
        )
    }
}

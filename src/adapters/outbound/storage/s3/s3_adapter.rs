use async_trait::async_trait;
use aws_sdk_s3::{
    presigning::PresigningConfig,
    primitives::{ByteStream, DateTime as SdkDateTime},
    types::{
        BucketLocationConstraint, CorsConfiguration, CorsRule as S3CorsRule,
        CreateBucketConfiguration,
    },
    Client,
};
use chrono::{DateTime, Utc};
use std::time::{Duration, SystemTime};

use crate::{
    domain::{
        errors::{StorageError, StorageResult},
        models::{CorsRule, ObjectDownload, ObjectSource, ResponseOverrides},
    },
    ports::storage::StorageClient,
};

/// Storage client backed by `aws_sdk_s3::Client`
#[derive(Debug, Clone)]
pub struct S3StorageClient {
    client: Client,
    location_constraint: Option<String>,
}

impl S3StorageClient {
    pub fn new(client: Client, location_constraint: Option<String>) -> Self {
        Self {
            client,
            location_constraint,
        }
    }

    /// The wrapped SDK client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    fn presigning_config(
        operation: &'static str,
        signed_at: DateTime<Utc>,
        expires_in: Duration,
    ) -> StorageResult<PresigningConfig> {
        PresigningConfig::builder()
            .start_time(SystemTime::from(signed_at))
            .expires_in(expires_in)
            .build()
            .map_err(|e| StorageError::backend(operation, e))
    }
}

fn to_sdk_rule(rule: CorsRule) -> StorageResult<S3CorsRule> {
    let non_empty = |values: Vec<String>| (!values.is_empty()).then_some(values);

    S3CorsRule::builder()
        .set_id(rule.id)
        .set_allowed_methods(Some(rule.allowed_methods))
        .set_allowed_origins(Some(rule.allowed_origins))
        .set_allowed_headers(non_empty(rule.allowed_headers))
        .set_expose_headers(non_empty(rule.expose_headers))
        .set_max_age_seconds(rule.max_age_seconds)
        .build()
        .map_err(|e| StorageError::backend("put_bucket_cors", e))
}

fn from_sdk_rule(rule: &S3CorsRule) -> CorsRule {
    CorsRule {
        id: rule.id().map(str::to_string),
        allowed_methods: rule.allowed_methods().to_vec(),
        allowed_origins: rule.allowed_origins().to_vec(),
        allowed_headers: rule.allowed_headers().to_vec(),
        expose_headers: rule.expose_headers().to_vec(),
        max_age_seconds: rule.max_age_seconds(),
    }
}

/// `CopySource` header value: source bucket and URL-encoded key
fn copy_source(bucket: &str, key: &str) -> String {
    format!("{}/{}", bucket, urlencoding::encode(key))
}

#[async_trait]
impl StorageClient for S3StorageClient {
    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let not_found = err
                    .as_service_error()
                    .map(|service_err| service_err.is_not_found())
                    .unwrap_or(false);

                if not_found {
                    Ok(false)
                } else {
                    Err(StorageError::backend("head_bucket", err))
                }
            }
        }
    }

    async fn create_bucket(&self, bucket: &str) -> StorageResult<()> {
        let mut request = self.client.create_bucket().bucket(bucket);

        if let Some(constraint) = &self.location_constraint {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(constraint.as_str()))
                    .build(),
            );
        }

        request
            .send()
            .await
            .map_err(|e| StorageError::backend("create_bucket", e))?;

        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> StorageResult<()> {
        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| StorageError::backend("delete_bucket", e))?;

        Ok(())
    }

    async fn get_bucket_cors(&self, bucket: &str) -> StorageResult<Vec<CorsRule>> {
        let output = self
            .client
            .get_bucket_cors()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| StorageError::backend("get_bucket_cors", e))?;

        Ok(output.cors_rules().iter().map(from_sdk_rule).collect())
    }

    async fn put_bucket_cors(&self, bucket: &str, rules: Vec<CorsRule>) -> StorageResult<()> {
        let rules = rules
            .into_iter()
            .map(to_sdk_rule)
            .collect::<StorageResult<Vec<_>>>()?;

        let configuration = CorsConfiguration::builder()
            .set_cors_rules(Some(rules))
            .build()
            .map_err(|e| StorageError::backend("put_bucket_cors", e))?;

        self.client
            .put_bucket_cors()
            .bucket(bucket)
            .cors_configuration(configuration)
            .send()
            .await
            .map_err(|e| StorageError::backend("put_bucket_cors", e))?;

        Ok(())
    }

    async fn delete_bucket_cors(&self, bucket: &str) -> StorageResult<()> {
        self.client
            .delete_bucket_cors()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| StorageError::backend("delete_bucket_cors", e))?;

        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        source: ObjectSource,
        content_type: &str,
    ) -> StorageResult<()> {
        let declared_size = source.declared_size();
        let body = match source {
            ObjectSource::File(path) => ByteStream::from_path(&path)
                .await
                .map_err(|e| StorageError::backend("put_object", e))?,
            stream => {
                let data = stream
                    .read_to_bytes()
                    .await
                    .map_err(|e| StorageError::backend("put_object", e))?;
                ByteStream::from(data)
            }
        };

        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(body);

        if let Some(size) = declared_size.and_then(|size| i64::try_from(size).ok()) {
            request = request.content_length(size);
        }

        request
            .send()
            .await
            .map_err(|e| StorageError::backend("put_object", e))?;

        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectDownload> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::backend("get_object", e))?;

        let content_type = output.content_type().map(str::to_string);
        let content_length = output
            .content_length()
            .and_then(|length| u64::try_from(length).ok());
        let e_tag = output.e_tag().map(str::to_string);

        Ok(ObjectDownload::new(output.body.into_async_read())
            .with_content_type(content_type)
            .with_content_length(content_length)
            .with_e_tag(e_tag))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::backend("delete_object", e))?;

        Ok(())
    }

    async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        destination_key: &str,
    ) -> StorageResult<()> {
        self.client
            .copy_object()
            .copy_source(copy_source(source_bucket, source_key))
            .bucket(destination_bucket)
            .key(destination_key)
            .send()
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
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .max_keys(i32::try_from(max_keys).unwrap_or(i32::MAX))
            .send()
            .await
            .map_err(|e| StorageError::backend("list_objects_v2", e))?;

        Ok(output
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .take(max_keys)
            .collect())
    }

    async fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        signed_at: DateTime<Utc>,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let config = Self::presigning_config("presign_put", signed_at, expires_in)?;

        let request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|e| StorageError::backend("presign_put", e))?;

        Ok(request.uri().to_string())
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        signed_at: DateTime<Utc>,
        expires_in: Duration,
        overrides: &ResponseOverrides,
    ) -> StorageResult<String> {
        let config = Self::presigning_config("presign_get", signed_at, expires_in)?;

        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .set_response_expires(
                overrides
                    .expires
                    .map(|expires| SdkDateTime::from_secs(expires.timestamp())),
            )
            .set_response_content_type(overrides.content_type.clone())
            .set_response_cache_control(overrides.cache_control.clone())
            .set_response_content_disposition(overrides.content_disposition.clone())
            .presigned(config)
            .await
            .map_err(|e| StorageError::backend("presign_get", e))?;

        Ok(request.uri().to_string())
    }
}

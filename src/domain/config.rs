use crate::domain::errors::{StorageError, StorageResult};

/// Host identifier of the default object-storage provider
pub const DEFAULT_PROVIDER_HOST: &str = "s3.amazonaws.com";

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Connection settings for one S3-compatible endpoint.
///
/// A `ServerConfig` is immutable once built. The adapter that receives it
/// validates it once, at construction, and keeps it for its lifetime.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerConfig {
    endpoint: String,
    region: Option<String>,
    access_key: String,
    secret_key: String,
    secure: bool,
    provider_host: String,
}

impl ServerConfig {
    /// Create a configuration for `endpoint` using the given credentials
    pub fn new(
        endpoint: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            region: None,
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            secure: true,
            provider_host: DEFAULT_PROVIDER_HOST.to_string(),
        }
    }

    /// Set the region requests are signed for
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Choose between `https` (default) and `http`
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Override the provider host the endpoint is validated against
    pub fn with_provider_host(mut self, provider_host: impl Into<String>) -> Self {
        self.provider_host = provider_host.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.trim()
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Configured region, falling back to [`DEFAULT_REGION`]
    pub fn region_or_default(&self) -> &str {
        self.region().unwrap_or(DEFAULT_REGION)
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    pub fn provider_host(&self) -> &str {
        &self.provider_host
    }

    /// Full endpoint URL including scheme
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}", scheme, self.endpoint())
    }

    /// Whether the endpoint is the default provider, whose regional
    /// endpoints the SDK resolves on its own
    pub fn is_default_provider(&self) -> bool {
        self.endpoint().eq_ignore_ascii_case(DEFAULT_PROVIDER_HOST)
    }

    /// Validate the configuration
    pub fn validate(&self) -> StorageResult<()> {
        validate_endpoint(&self.endpoint, &self.provider_host)?;

        if self.access_key.trim().is_empty() {
            return Err(StorageError::Configuration {
                message: "access key cannot be empty".to_string(),
            });
        }

        if self.secret_key.trim().is_empty() {
            return Err(StorageError::Configuration {
                message: "secret key cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("secure", &self.secure)
            .field("provider_host", &self.provider_host)
            .finish()
    }
}

/// Check that `endpoint` names the expected provider host.
///
/// Both sides are trimmed and compared case-insensitively; anything other
/// than an exact match is a configuration error.
pub fn validate_endpoint(endpoint: &str, provider_host: &str) -> StorageResult<()> {
    let endpoint = endpoint.trim();

    if endpoint.is_empty() {
        return Err(StorageError::Configuration {
            message: "endpoint cannot be empty".to_string(),
        });
    }

    if !endpoint.eq_ignore_ascii_case(provider_host.trim()) {
        return Err(StorageError::Configuration {
            message: format!(
                "endpoint '{}' does not match provider host '{}'",
                endpoint, provider_host
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_matches_ignoring_case_and_whitespace() {
        assert!(validate_endpoint("s3.amazonaws.com", DEFAULT_PROVIDER_HOST).is_ok());
        assert!(validate_endpoint("  S3.AmazonAWS.com\n", DEFAULT_PROVIDER_HOST).is_ok());
        assert!(validate_endpoint("localhost:9000", " LOCALHOST:9000 ").is_ok());
    }

    #[test]
    fn test_endpoint_mismatch_is_rejected() {
        for endpoint in [
            "",
            "   ",
            "s3.amazonaws.co",
            "https://s3.amazonaws.com",
            "s3.amazonaws.com/bucket",
            "my-bucket.s3.amazonaws.com",
            "storage.googleapis.com",
        ] {
            let err = validate_endpoint(endpoint, DEFAULT_PROVIDER_HOST).unwrap_err();
            assert!(
                matches!(err, StorageError::Configuration { .. }),
                "expected configuration error for {:?}",
                endpoint
            );
        }
    }

    #[test]
    fn test_validate_rejects_empty_credentials() {
        let config = ServerConfig::new("s3.amazonaws.com", "", "secret");
        assert!(matches!(
            config.validate(),
            Err(StorageError::Configuration { .. })
        ));

        let config = ServerConfig::new("s3.amazonaws.com", "access", " ");
        assert!(matches!(
            config.validate(),
            Err(StorageError::Configuration { .. })
        ));
    }

    #[test]
    fn test_endpoint_url_and_region() {
        let config = ServerConfig::new(" localhost:9000 ", "minioadmin", "minioadmin")
            .with_secure(false)
            .with_provider_host("localhost:9000");

        assert!(config.validate().is_ok());
        assert_eq!(config.endpoint_url(), "http://localhost:9000");
        assert_eq!(config.region_or_default(), DEFAULT_REGION);
        assert!(!config.is_default_provider());

        let config = ServerConfig::new("s3.amazonaws.com", "a", "b").with_region("eu-west-1");
        assert_eq!(config.endpoint_url(), "https://s3.amazonaws.com");
        assert_eq!(config.region_or_default(), "eu-west-1");
        assert!(config.is_default_provider());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = ServerConfig::new("s3.amazonaws.com", "access", "top-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("top-secret"));
        assert!(debug.contains("<redacted>"));
    }
}

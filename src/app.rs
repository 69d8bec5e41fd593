use std::sync::Arc;

use crate::{
    adapters::outbound::storage::{InMemoryConnector, S3Connector},
    domain::{config::ServerConfig, errors::StorageError},
    ports::storage::ClientConnector,
    services::ObjectStoreAdapter,
};

/// Host identifier used by the in-memory backend
pub const IN_MEMORY_HOST: &str = "in-memory";

/// Configuration for the application
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub storage_backend: StorageBackend,
}

/// Storage backend configuration
#[derive(Debug, Clone, Default)]
pub enum StorageBackend {
    #[default]
    InMemory,
    S3 {
        endpoint: String,
        region: Option<String>,
        access_key: String,
        secret_key: String,
        use_ssl: bool,
        provider_host: Option<String>,
    },
}

impl StorageBackend {
    /// Server configuration the adapter is built from
    pub fn server_config(&self) -> ServerConfig {
        match self {
            StorageBackend::InMemory => ServerConfig::new(IN_MEMORY_HOST, "memory", "memory")
                .with_secure(false)
                .with_provider_host(IN_MEMORY_HOST),
            StorageBackend::S3 {
                endpoint,
                region,
                access_key,
                secret_key,
                use_ssl,
                provider_host,
            } => {
                let mut config =
                    ServerConfig::new(endpoint.as_str(), access_key.as_str(), secret_key.as_str())
                        .with_secure(*use_ssl);

                if let Some(region) = region {
                    config = config.with_region(region.as_str());
                }
                if let Some(provider_host) = provider_host {
                    config = config.with_provider_host(provider_host.as_str());
                }

                config
            }
        }
    }

    fn connector(&self) -> Arc<dyn ClientConnector> {
        match self {
            StorageBackend::InMemory => Arc::new(InMemoryConnector::new()),
            StorageBackend::S3 { .. } => Arc::new(S3Connector::new()),
        }
    }
}

impl AppConfig {
    /// Read the configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name
    /// to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name).ok_or_else(|| AppError::Configuration {
                message: format!("{} environment variable required", name),
            })
        };

        let storage_backend = match lookup("STORAGE_BACKEND").as_deref() {
            Some("s3") => StorageBackend::S3 {
                endpoint: required("S3_ENDPOINT")?,
                region: lookup("S3_REGION"),
                access_key: required("S3_ACCESS_KEY")?,
                secret_key: required("S3_SECRET_KEY")?,
                use_ssl: lookup("S3_USE_SSL")
                    .map(|value| parse_flag("S3_USE_SSL", &value))
                    .transpose()?
                    .unwrap_or(true),
                provider_host: lookup("S3_PROVIDER_HOST"),
            },
            Some("memory") | None => StorageBackend::InMemory,
            Some(other) => {
                return Err(AppError::Configuration {
                    message: format!("Unknown storage backend: {}", other),
                })
            }
        };

        Ok(Self { storage_backend })
    }
}

/// Parse a boolean variable, accepting the same spellings as the CLI's
/// `--use-ssl` flag
fn parse_flag(name: &str, value: &str) -> Result<bool, AppError> {
    match value.trim().to_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Ok(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Ok(false),
        other => Err(AppError::Configuration {
            message: format!("{} must be a boolean, got '{}'", name, other),
        }),
    }
}

/// Application builder for dependency injection
#[derive(Default)]
pub struct AppBuilder {
    config: AppConfig,
    connector: Option<Arc<dyn ClientConnector>>,
}

impl AppBuilder {
    /// Create a new application builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the application with custom settings
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Configure storage backend
    pub fn with_storage_backend(mut self, backend: StorageBackend) -> Self {
        self.config.storage_backend = backend;
        self
    }

    /// Use `connector` instead of the backend's default one
    pub fn with_connector(mut self, connector: Arc<dyn ClientConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Build the adapter without connecting it
    pub fn build(self) -> Result<ObjectStoreAdapter, AppError> {
        let backend = &self.config.storage_backend;
        let connector = self.connector.unwrap_or_else(|| backend.connector());

        Ok(ObjectStoreAdapter::with_connector(
            backend.server_config(),
            connector,
        )?)
    }

    /// Build the adapter and establish its client
    pub async fn build_connected(self) -> Result<ObjectStoreAdapter, AppError> {
        let adapter = self.build()?;
        adapter.connect().await?;
        Ok(adapter)
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Convenience functions for common configurations
///
/// Create a connected in-memory adapter for testing and development
pub async fn create_in_memory_adapter() -> Result<ObjectStoreAdapter, AppError> {
    AppBuilder::new()
        .with_storage_backend(StorageBackend::InMemory)
        .build_connected()
        .await
}

/// Create a connected adapter for an S3-compatible endpoint
pub async fn create_s3_adapter(config: ServerConfig) -> Result<ObjectStoreAdapter, AppError> {
    let adapter = ObjectStoreAdapter::new(config)?;
    adapter.connect().await?;
    Ok(adapter)
}

/// Create a connected adapter from environment variables
pub async fn create_adapter_from_env() -> Result<ObjectStoreAdapter, AppError> {
    AppBuilder::new()
        .with_config(AppConfig::from_env()?)
        .build_connected()
        .await
}

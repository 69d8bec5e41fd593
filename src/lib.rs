pub mod adapters;
pub mod app;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export key types for convenience

// Domain types - configuration, models and errors
pub use domain::{
    validate_endpoint,
    CorsRule,
    ObjectDownload,
    ObjectSource,
    PresignedUrl,
    ResponseOverrides,
    ServerConfig,
    // Errors
    StorageError,
    StorageResult,
    DEFAULT_PROVIDER_HOST,
};

// Port types - interfaces for external systems
pub use ports::{ClientConnector, StorageClient};

// Service implementations
pub use services::ObjectStoreAdapter;

// Application factory and configuration
pub use app::{
    create_adapter_from_env, create_in_memory_adapter, create_s3_adapter, AppBuilder, AppConfig,
    AppError, StorageBackend,
};

// Adapter types - infrastructure implementations
pub use adapters::outbound::storage::{
    InMemoryConnector, InMemoryError, InMemoryStorageClient, S3Connector, S3StorageClient,
};

// Public facade for easy construction
pub mod prelude {
    pub use crate::{
        create_in_memory_adapter, AppBuilder, CorsRule, ObjectSource, ObjectStoreAdapter,
        ResponseOverrides, ServerConfig, StorageError, StorageResult,
    };
}

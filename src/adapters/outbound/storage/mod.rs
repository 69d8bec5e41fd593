// Infrastructure error types
pub mod error;

// Storage implementations
pub mod memory;
pub mod s3;

// Re-export key types
pub use error::InMemoryError;
pub use memory::{InMemoryConnector, InMemoryStorageClient};
pub use s3::{S3Connector, S3StorageClient};

pub mod config;
pub mod errors;
pub mod models;

// Re-export commonly used types
pub use config::{validate_endpoint, ServerConfig, DEFAULT_PROVIDER_HOST, DEFAULT_REGION};
pub use errors::{BackendError, StorageError, StorageResult};
pub use models::*;

use thiserror::Error as ThisError;

/// Boxed native error raised by a storage backend
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during adapter operations.
///
/// Backend failures are never translated: the client's own error is kept as
/// the source of [`StorageError::Backend`] and can be recovered with
/// [`StorageError::backend_source`].
#[derive(ThisError, Debug)]
pub enum StorageError {
    /// The adapter configuration was rejected at construction
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// An operation ran before the underlying client was connected
    #[error("Uninitialized resource: {resource} (call connect first)")]
    Uninitialized { resource: &'static str },

    /// An argument was rejected before reaching the backend
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The storage backend reported a failure
    #[error("{operation} failed: {source}")]
    Backend {
        operation: &'static str,
        #[source]
        source: BackendError,
    },
}

impl StorageError {
    /// Wrap a native backend error raised by `operation`
    pub fn backend<E>(operation: &'static str, source: E) -> Self
    where
        E: Into<BackendError>,
    {
        StorageError::Backend {
            operation,
            source: source.into(),
        }
    }

    /// Name of the backend operation that failed, if any
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            StorageError::Backend { operation, .. } => Some(operation),
            _ => None,
        }
    }

    /// Downcast the backend's native error to a concrete type
    pub fn backend_source<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            StorageError::Backend { source, .. } => source.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_source_downcasts_to_native_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.bin");
        let err = StorageError::backend("put_object", io);

        assert_eq!(err.operation(), Some("put_object"));
        let native = err.backend_source::<std::io::Error>().unwrap();
        assert_eq!(native.kind(), std::io::ErrorKind::NotFound);
        assert!(err.backend_source::<std::fmt::Error>().is_none());
        assert_eq!(err.to_string(), "put_object failed: missing.bin");
    }

    #[test]
    fn test_non_backend_errors_have_no_source() {
        let err = StorageError::Uninitialized {
            resource: "storage client",
        };
        assert!(err.operation().is_none());
        assert!(err.backend_source::<std::io::Error>().is_none());
    }
}

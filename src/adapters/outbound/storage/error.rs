use thiserror::Error as ThisError;

/// Native errors of the in-memory backend.
///
/// They mirror the S3 error codes the real service returns for the same
/// situations, so callers observe the same failure modes in tests.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum InMemoryError {
    #[error("NoSuchBucket: the specified bucket does not exist: {bucket}")]
    NoSuchBucket { bucket: String },

    #[error("BucketAlreadyOwnedByYou: bucket already exists: {bucket}")]
    BucketAlreadyExists { bucket: String },

    #[error("BucketNotEmpty: the bucket you tried to delete is not empty: {bucket}")]
    BucketNotEmpty { bucket: String },

    #[error("InvalidBucketName: {bucket}: {reason}")]
    InvalidBucketName { bucket: String, reason: String },

    #[error("NoSuchKey: the specified key does not exist: {bucket}/{key}")]
    NoSuchKey { bucket: String, key: String },

    #[error("NoSuchCORSConfiguration: the CORS configuration does not exist: {bucket}")]
    NoSuchCorsConfiguration { bucket: String },

    #[error("AuthorizationQueryParametersError: expiry must be between 1 and {max} seconds, got {actual}")]
    InvalidExpiry { actual: u64, max: u64 },
}

/// Validate a bucket name according to S3 naming rules
pub fn validate_bucket_name(name: &str) -> Result<(), InMemoryError> {
    let invalid = |reason: &str| InMemoryError::InvalidBucketName {
        bucket: name.to_string(),
        reason: reason.to_string(),
    };

    // Length validation
    if name.len() < 3 || name.len() > 63 {
        return Err(invalid("bucket name must be between 3 and 63 characters"));
    }

    // Must start and end with lowercase letter or number
    let is_alphanumeric = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    if !name.chars().next().is_some_and(is_alphanumeric) {
        return Err(invalid(
            "bucket name must start with a lowercase letter or number",
        ));
    }
    if !name.chars().last().is_some_and(is_alphanumeric) {
        return Err(invalid("bucket name must end with a lowercase letter or number"));
    }

    // Can only contain lowercase letters, numbers, hyphens, and dots
    if let Some(c) = name
        .chars()
        .find(|&c| !is_alphanumeric(c) && c != '-' && c != '.')
    {
        return Err(invalid(&format!("invalid character '{}'", c)));
    }

    if name.contains("..") {
        return Err(invalid("bucket name cannot contain consecutive dots"));
    }

    // Cannot be formatted as IP address
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() == 4 && parts.iter().all(|part| part.parse::<u8>().is_ok()) {
        return Err(invalid("bucket name cannot be formatted as an IP address"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_bucket_names() {
        assert!(validate_bucket_name("my-bucket").is_ok());
        assert!(validate_bucket_name("bucket123").is_ok());
        assert!(validate_bucket_name("123bucket").is_ok());
        assert!(validate_bucket_name("my.bucket.logs").is_ok());
    }

    #[test]
    fn test_invalid_bucket_names() {
        // Too short / too long
        assert!(validate_bucket_name("ab").is_err());
        assert!(validate_bucket_name(&"a".repeat(64)).is_err());

        // Invalid start/end
        assert!(validate_bucket_name("-bucket").is_err());
        assert!(validate_bucket_name("bucket-").is_err());
        assert!(validate_bucket_name("Bucket").is_err());

        // Invalid characters
        assert!(validate_bucket_name("my_bucket").is_err());
        assert!(validate_bucket_name("my bucket").is_err());
        assert!(validate_bucket_name("my..bucket").is_err());

        // IP address format
        assert!(validate_bucket_name("192.168.1.1").is_err());
    }

    #[test]
    fn test_errors_name_the_s3_code() {
        let err = InMemoryError::NoSuchKey {
            bucket: "docs".to_string(),
            key: "a.txt".to_string(),
        };
        assert!(err.to_string().starts_with("NoSuchKey"));
    }
}

use chrono::{DateTime, TimeDelta, Utc};

use crate::domain::errors::{StorageError, StorageResult};

/// Longest validity a SigV4 presigned URL may have (seven days)
pub const MAX_PRESIGN_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

/// A time-limited URL granting one unauthenticated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedUrl {
    pub url: String,
    pub method: http::Method,
    pub expires_at: DateTime<Utc>,
}

/// Response headers a presigned GET asks the store to override
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseOverrides {
    pub expires: Option<DateTime<Utc>>,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    pub content_disposition: Option<String>,
}

impl ResponseOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_cache_control(mut self, cache_control: impl Into<String>) -> Self {
        self.cache_control = Some(cache_control.into());
        self
    }

    pub fn with_content_disposition(mut self, content_disposition: impl Into<String>) -> Self {
        self.content_disposition = Some(content_disposition.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.expires.is_none()
            && self.content_type.is_none()
            && self.cache_control.is_none()
            && self.content_disposition.is_none()
    }

    /// S3 query parameters carrying each override, in signing order
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        if let Some(cache_control) = &self.cache_control {
            params.push(("response-cache-control", cache_control.clone()));
        }
        if let Some(content_disposition) = &self.content_disposition {
            params.push(("response-content-disposition", content_disposition.clone()));
        }
        if let Some(content_type) = &self.content_type {
            params.push(("response-content-type", content_type.clone()));
        }
        if let Some(expires) = &self.expires {
            params.push((
                "response-expires",
                expires.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
            ));
        }

        params
    }
}

/// Instant a URL signed at `signed_at` stops being valid.
///
/// Fails when the expiry is not representable as a date.
pub fn presign_expiry(
    signed_at: DateTime<Utc>,
    expires_in_secs: u64,
) -> StorageResult<DateTime<Utc>> {
    i64::try_from(expires_in_secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| signed_at.checked_add_signed(delta))
        .ok_or(StorageError::InvalidArgument {
            message: format!("presign expiry of {} seconds is out of range", expires_in_secs),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_each_override_maps_to_its_own_parameter() {
        let expires = Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap();
        let overrides = ResponseOverrides::new()
            .with_expires(expires)
            .with_content_type("application/pdf")
            .with_cache_control("no-cache")
            .with_content_disposition("attachment; filename=\"report.pdf\"");

        let params = overrides.query_params();

        assert_eq!(
            params,
            vec![
                ("response-cache-control", "no-cache".to_string()),
                (
                    "response-content-disposition",
                    "attachment; filename=\"report.pdf\"".to_string()
                ),
                ("response-content-type", "application/pdf".to_string()),
                ("response-expires", "Wed, 02 Jan 2030 03:04:05 GMT".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_overrides() {
        let overrides = ResponseOverrides::default();
        assert!(overrides.is_empty());
        assert!(overrides.query_params().is_empty());
        assert!(!overrides.with_content_type("text/plain").is_empty());
    }

    #[test]
    fn test_presign_expiry_adds_seconds() {
        let signed_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(
            presign_expiry(signed_at, 60).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 1, 0).unwrap()
        );
    }

    #[test]
    fn test_presign_expiry_out_of_range_is_error() {
        let signed_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        for secs in [u64::MAX, i64::MAX as u64, i64::MAX as u64 / 1000 + 1, 400_000 * 365 * 86_400] {
            assert!(matches!(
                presign_expiry(signed_at, secs),
                Err(StorageError::InvalidArgument { .. })
            ));
        }
    }
}

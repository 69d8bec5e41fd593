use serde::{Deserialize, Serialize};

/// Wildcard accepted for origins and headers
pub const CORS_WILDCARD: &str = "*";

/// A cross-origin rule attached to a bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_origins: Vec<String>,
    #[serde(default)]
    pub allowed_headers: Vec<String>,
    #[serde(default)]
    pub expose_headers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age_seconds: Option<i32>,
}

impl CorsRule {
    /// Rule allowing browser uploads (`PUT`, any header) from one origin.
    ///
    /// A missing or blank origin allows every origin.
    pub fn put_from_origin(allowed_origin: Option<&str>) -> Self {
        let origin = allowed_origin
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .unwrap_or(CORS_WILDCARD);

        Self {
            id: None,
            allowed_methods: vec![http::Method::PUT.to_string()],
            allowed_origins: vec![origin.to_string()],
            allowed_headers: vec![CORS_WILDCARD.to_string()],
            expose_headers: Vec::new(),
            max_age_seconds: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_rule_for_explicit_origin() {
        let rule = CorsRule::put_from_origin(Some("https://example.com"));

        assert_eq!(rule.allowed_methods, vec!["PUT"]);
        assert_eq!(rule.allowed_origins, vec!["https://example.com"]);
        assert_eq!(rule.allowed_headers, vec!["*"]);
        assert!(rule.expose_headers.is_empty());
    }

    #[test]
    fn test_put_rule_defaults_to_any_origin() {
        assert_eq!(
            CorsRule::put_from_origin(None).allowed_origins,
            vec![CORS_WILDCARD]
        );
        assert_eq!(
            CorsRule::put_from_origin(Some("  ")).allowed_origins,
            vec![CORS_WILDCARD]
        );
    }

    #[test]
    fn test_rule_serializes_without_empty_options() {
        let json = serde_json::to_value(CorsRule::put_from_origin(None)).unwrap();

        assert_eq!(json["allowed_methods"][0], "PUT");
        assert!(json.get("id").is_none());
        assert!(json.get("max_age_seconds").is_none());
    }
}

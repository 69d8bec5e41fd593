use chrono::{NaiveDateTime, TimeZone, Utc};
use object_store_adapter::{
    create_s3_adapter, ObjectStoreAdapter, PresignedUrl, ResponseOverrides, ServerConfig,
};

// Presigning is computed locally by the SDK, so these tests need no server.

fn query_param<'a>(url: &'a str, name: &str) -> Option<&'a str> {
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn assert_expiry_matches_signature(presigned: &PresignedUrl, expected_secs: i64) {
    let date = query_param(&presigned.url, "X-Amz-Date").expect("X-Amz-Date missing");
    let expires: i64 = query_param(&presigned.url, "X-Amz-Expires")
        .expect("X-Amz-Expires missing")
        .parse()
        .unwrap();

    assert_eq!(expires, expected_secs);

    let signed_at = Utc.from_utc_datetime(
        &NaiveDateTime::parse_from_str(date, "%Y%m%dT%H%M%SZ").unwrap(),
    );
    assert_eq!(
        presigned.expires_at,
        signed_at + chrono::Duration::seconds(expires)
    );
}

async fn aws_adapter() -> ObjectStoreAdapter {
    let config = ServerConfig::new("s3.amazonaws.com", "AKIDEXAMPLE", "secret").with_region("us-east-1");
    create_s3_adapter(config).await.unwrap()
}

async fn minio_adapter() -> ObjectStoreAdapter {
    let config = ServerConfig::new("localhost:9000", "minioadmin", "minioadmin")
        .with_secure(false)
        .with_provider_host("localhost:9000");
    create_s3_adapter(config).await.unwrap()
}

#[tokio::test]
async fn test_presigned_put_url_expiry() {
    let adapter = aws_adapter().await;

    let before = Utc::now() - chrono::Duration::seconds(1);
    let presigned = adapter
        .presigned_put_url("uploads", "avatar.png", 60)
        .await
        .unwrap();
    let after = Utc::now();

    assert_eq!(presigned.method, http::Method::PUT);
    assert!(presigned.url.starts_with("https://"));
    assert!(presigned.url.contains("avatar.png"));
    assert!(query_param(&presigned.url, "X-Amz-Signature").is_some());

    assert_expiry_matches_signature(&presigned, 60);
    assert!(presigned.expires_at >= before + chrono::Duration::seconds(60));
    assert!(presigned.expires_at <= after + chrono::Duration::seconds(60));
}

#[tokio::test]
async fn test_presigned_get_url_without_overrides() {
    let adapter = aws_adapter().await;

    let presigned = adapter
        .presigned_get_url("downloads", "report.pdf", 300, None)
        .await
        .unwrap();

    assert_eq!(presigned.method, http::Method::GET);
    assert_expiry_matches_signature(&presigned, 300);
    assert!(query_param(&presigned.url, "response-content-type").is_none());
    assert!(query_param(&presigned.url, "response-cache-control").is_none());
}

#[tokio::test]
async fn test_presigned_get_url_carries_each_override() {
    let adapter = aws_adapter().await;

    let overrides = ResponseOverrides::new()
        .with_content_type("application/pdf")
        .with_cache_control("no-cache")
        .with_content_disposition("attachment")
        .with_expires(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());

    let presigned = adapter
        .presigned_get_url("downloads", "report.pdf", 60, Some(&overrides))
        .await
        .unwrap();

    assert!(query_param(&presigned.url, "response-content-type")
        .is_some_and(|value| value.contains("pdf")));
    assert_eq!(
        query_param(&presigned.url, "response-cache-control"),
        Some("no-cache")
    );
    assert_eq!(
        query_param(&presigned.url, "response-content-disposition"),
        Some("attachment")
    );
    assert!(query_param(&presigned.url, "response-expires").is_some());
}

#[tokio::test]
async fn test_presigned_url_for_custom_provider_is_path_style() {
    let adapter = minio_adapter().await;

    let presigned = adapter
        .presigned_put_url("bucket", "folder/file.txt", 120)
        .await
        .unwrap();

    assert!(
        presigned.url.starts_with("http://localhost:9000/bucket/"),
        "unexpected url: {}",
        presigned.url
    );
    assert_expiry_matches_signature(&presigned, 120);
}

#[tokio::test]
async fn test_presign_rejects_expiry_past_seven_days() {
    let adapter = minio_adapter().await;

    let result = adapter
        .presigned_put_url("bucket", "file.txt", 8 * 24 * 60 * 60)
        .await;

    assert!(result.is_err());
}

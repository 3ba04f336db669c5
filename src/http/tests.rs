//! Tests for the HTTP client

use super::*;
use crate::auth::TokenProvider;
use crate::config::Credentials;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_get_json() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": 1}, {"id": 2}]
        })))
        .mount(&server)
        .await;

    let client = HttpClient::with_config(HttpClientConfig::with_base_url(server.uri()));
    let body: serde_json::Value = client
        .get_json("/api/items", RequestConfig::new())
        .await
        .unwrap();

    assert_eq!(body["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_query_params_are_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/items"))
        .and(query_param("fromDate", "2024-01-01"))
        .and(query_param("toDate", "2024-01-31"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::with_config(HttpClientConfig::with_base_url(server.uri()));
    let config = RequestConfig::new()
        .query("fromDate", "2024-01-01")
        .query("toDate", "2024-01-31");
    client.get_with_config("/api/items", config).await.unwrap();
}

#[tokio::test]
async fn test_bearer_token_attached() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "abc123",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/protected"))
        .and(header("Authorization", "Bearer abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let provider = Arc::new(TokenProvider::new(
        format!("{}/connect/token", server.uri()),
        Credentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        },
        "scope",
    ));

    let client = HttpClient::with_config(HttpClientConfig::with_base_url(server.uri()))
        .with_token_provider(provider);
    client.get("/api/protected").await.unwrap();
}

#[tokio::test]
async fn test_non_2xx_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("server error"))
        .mount(&server)
        .await;

    let client = HttpClient::with_config(HttpClientConfig::with_base_url(server.uri()));
    let err = client.get("/api/broken").await.unwrap_err();
    assert!(err.to_string().contains("500"));
}

#[test]
fn test_build_url_joins_base_and_path() {
    let client = HttpClient::with_config(HttpClientConfig::with_base_url(
        "https://api.actigraphcorp.com/",
    ));
    assert_eq!(
        client.build_url("/analytics/v3/Studies/1").unwrap(),
        "https://api.actigraphcorp.com/analytics/v3/Studies/1"
    );
    // Absolute URLs pass through untouched
    assert_eq!(
        client.build_url("https://other.example.com/x").unwrap(),
        "https://other.example.com/x"
    );
}

#[test]
fn test_build_url_rejects_unparseable_base() {
    let client = HttpClient::with_config(HttpClientConfig::with_base_url("not a url"));
    let err = client.build_url("/analytics/v3/Studies/1").unwrap_err();
    assert!(matches!(err, crate::error::Error::InvalidUrl(_)));
}

//! Integration tests for the upstream API client.
//!
//! A mock server stands in for the real API so the tests can exercise the
//! auth headers, query parameters, non-200 handling, and rate-guard spacing
//! without touching the network.

use serde_json::json;
use ucl_ingest::api::{ApiClient, ApiError};
use ucl_ingest::config::ApiConfig;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(base_url: &str) -> ApiConfig {
    ApiConfig {
        base_url: base_url.to_string(),
        host: "uefa-champions-league1.p.rapidapi.com".to_string(),
        api_key: "test-key".to_string(),
        timeout_secs: 5,
        min_interval_ms: 0,
    }
}

#[tokio::test]
async fn test_fetch_parses_json_on_200() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/team/list"))
        .and(query_param("year", "2024"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"teams": [{"id": "83"}]})),
        )
        .mount(&server)
        .await;

    let client = ApiClient::new(&test_config(&server.uri())).unwrap();
    let payload = client
        .fetch("team/list", &[("year", "2024".to_string())])
        .await
        .unwrap();

    assert_eq!(payload["teams"][0]["id"], "83");
}

#[tokio::test]
async fn test_fetch_sends_auth_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/standings"))
        .and(header("X-RapidAPI-Key", "test-key"))
        .and(header(
            "X-RapidAPI-Host",
            "uefa-champions-league1.p.rapidapi.com",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"standings": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&test_config(&server.uri())).unwrap();
    client
        .fetch("standings", &[("year", "2023".to_string())])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_fetch_non_200_is_typed_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/schedule"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let client = ApiClient::new(&test_config(&server.uri())).unwrap();
    let err = client
        .fetch("schedule", &[("year", "2024".to_string())])
        .await
        .unwrap_err();

    match err {
        ApiError::Status {
            endpoint,
            status,
            body,
        } => {
            assert_eq!(endpoint, "schedule");
            assert_eq!(status, 429);
            assert_eq!(body, "quota exceeded");
        }
        other => panic!("expected Status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_check_probes_team_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/team/list"))
        .and(query_param("year", "2025"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "83"}])))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&test_config(&server.uri())).unwrap();
    client.check(2025).await.unwrap();
}

#[tokio::test]
async fn test_check_surfaces_auth_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/team/list"))
        .respond_with(ResponseTemplate::new(403).set_body_string("bad key"))
        .mount(&server)
        .await;

    let client = ApiClient::new(&test_config(&server.uri())).unwrap();
    let err = client.check(2025).await.unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 403, .. }));
}

#[tokio::test]
async fn test_rate_guard_spaces_consecutive_fetches() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/team/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.min_interval_ms = 100;
    let client = ApiClient::new(&config).unwrap();

    let start = std::time::Instant::now();
    let _ = client.fetch("team/list", &[]).await;
    let _ = client.fetch("team/list", &[]).await;

    assert!(start.elapsed() >= std::time::Duration::from_millis(100));
}

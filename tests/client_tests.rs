//! Integration tests for the API client
//!
//! These use wiremock to verify retry behavior and HTTP error
//! classification against a real HTTP stack.

use royale_harvest::client::{ApiClient, ClientError, HttpTransport, RetryPolicy};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_policy() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(100))
}

fn test_client(base_url: &str) -> ApiClient<HttpTransport> {
    let transport = HttpTransport::new("test-token").expect("failed to build transport");
    ApiClient::new(transport, base_url, fast_policy())
}

fn members_body() -> serde_json::Value {
    serde_json::json!({
        "items": [
            {"tag": "#AAA111", "name": "alice"},
            {"tag": "#BBB222", "name": "bob"}
        ]
    })
}

#[tokio::test]
async fn test_rate_limited_then_success() {
    let mock_server = MockServer::start().await;

    // Three 429s, then the real answer: one logical fetch, four attempts.
    Mock::given(method("GET"))
        .and(path("/clans/%23ABC123/members"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(3)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/clans/%23ABC123/members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(members_body()))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let members = client.clan_members("#ABC123").await.expect("fetch failed");

    assert_eq!(members, vec!["AAA111".to_string(), "BBB222".to_string()]);

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
}

#[tokio::test]
async fn test_retry_after_hint_is_honored() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/clans/%23ABC123/members"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/clans/%23ABC123/members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(members_body()))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    assert!(client.clan_members("ABC123").await.is_ok());
}

#[tokio::test]
async fn test_rate_limit_exhaustion() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let err = client.clan_members("ABC123").await.unwrap_err();

    assert!(matches!(err, ClientError::RateLimited { attempts: 4, .. }));
}

#[tokio::test]
async fn test_not_found_is_immediate() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let err = client.clan_members("ABC123").await.unwrap_err();

    assert!(matches!(err, ClientError::NotFound { .. }));

    // No retries for a missing entity.
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_unauthorized_is_immediate() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let err = client.clan_members("ABC123").await.unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized { status: 403 }));

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_server_errors_retry_then_fail() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let err = client.clan_members("ABC123").await.unwrap_err();

    assert!(matches!(err, ClientError::Transient { attempts: 4, .. }));

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
}

#[tokio::test]
async fn test_non_json_body_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let err = client.clan_members("ABC123").await.unwrap_err();

    assert!(matches!(err, ClientError::Parse { .. }));
}

#[tokio::test]
async fn test_battle_log_must_be_an_array() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/players/%23AAA111/battlelog"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"reason": "oops"})))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let err = client.battle_log("AAA111").await.unwrap_err();

    assert!(matches!(err, ClientError::Parse { .. }));
}

#[tokio::test]
async fn test_unexpected_status_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(418))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let err = client.clan_members("ABC123").await.unwrap_err();

    assert!(matches!(err, ClientError::UnexpectedStatus { status: 418, .. }));

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_battle_log_preserves_malformed_entries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/players/%23AAA111/battlelog"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"battleTime": "20250812T193204.000Z"},
            "garbage",
            42
        ])))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let battles = client.battle_log("#aaa111").await.expect("fetch failed");

    // Raw entries come back as-is; skipping is the normalizer's call.
    assert_eq!(battles.len(), 3);
}

//! Token exchange and event creation against a mock Graph endpoint.

use chrono::{TimeZone, Utc};
use watchsync_core::config::GraphSettings;
use watchsync_core::graph::{AccessToken, EventTemplate, GraphClient};
use watchsync_core::localize::{LocalizedRecord, Localizer};
use watchsync_core::normalize::end_of;
use watchsync_core::record::CanonicalWatchRecord;
use watchsync_core::SyncError;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn make_settings(server: &MockServer) -> GraphSettings {
    let text = format!(
        r#"
client_id = "app-id"
tenant_id = "tenant-id"
client_secret = "s3cret"
user_id = "me@example.com"
authority_url = "{uri}"
graph_url = "{uri}/v1.0"
"#,
        uri = server.uri()
    );
    toml::from_str(&text).unwrap()
}

fn make_record(title: &str) -> LocalizedRecord {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 15, 0, 0).unwrap();
    LocalizedRecord {
        record: CanonicalWatchRecord {
            playback_start: start,
            playback_end: end_of(start, 30).into(),
            title: title.to_string(),
            duration_minutes: 30,
        },
        interval: Localizer::default().interval(start, 30).unwrap(),
    }
}

fn make_template() -> EventTemplate {
    EventTemplate {
        subject_prefix: "Prime TV: ".to_string(),
        category: "Prime TV".to_string(),
        time_zone: "America/New_York".to_string(),
    }
}

#[tokio::test]
async fn test_acquire_token_posts_client_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tenant-id/oauth2/v2.0/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=app-id"))
        .and(body_string_contains("client_secret=s3cret"))
        .and(body_string_contains("scope=https%3A%2F%2Fgraph.microsoft.com%2F.default"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_type": "Bearer",
            "expires_in": 3599,
            "access_token": "token-123"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphClient::new(make_settings(&server)).unwrap();
    let token = client.acquire_token().await;

    assert!(token.is_ok(), "{:?}", token.err());
}

#[tokio::test]
async fn test_acquire_token_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tenant-id/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .mount(&server)
        .await;

    let client = GraphClient::new(make_settings(&server)).unwrap();
    let err = client.acquire_token().await.unwrap_err();

    assert!(matches!(err, SyncError::Auth(_)), "{err}");
    assert!(err.to_string().contains("invalid_client"));
}

#[tokio::test]
async fn test_acquire_token_without_access_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": "something odd"
        })))
        .mount(&server)
        .await;

    let client = GraphClient::new(make_settings(&server)).unwrap();
    let err = client.acquire_token().await.unwrap_err();

    assert!(matches!(err, SyncError::Auth(_)), "{err}");
}

#[tokio::test]
async fn test_create_event_sends_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1.0/users/me@example.com/events"))
        .and(header("Authorization", "Bearer token-123"))
        .and(body_json(serde_json::json!({
            "subject": "Prime TV: Reacher",
            "start": { "dateTime": "2024-01-01 10:00:00", "timeZone": "America/New_York" },
            "end": { "dateTime": "2024-01-01 10:30:00", "timeZone": "America/New_York" },
            "body": {
                "contentType": "HTML",
                "content": "Title: Reacher<br>Start: 2024-01-01 10:00:00<br>End: 2024-01-01 10:30:00<br>Duration: 30 minutes"
            },
            "categories": ["Prime TV"]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": "AAMkAGI2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphClient::new(make_settings(&server)).unwrap();
    let event = make_template().render(&make_record("Reacher"));
    let id = client
        .create_event(&AccessToken::new("token-123"), &event)
        .await
        .unwrap();

    assert_eq!(id.as_deref(), Some("AAMkAGI2"));
}

#[tokio::test]
async fn test_create_event_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1.0/users/me@example.com/events"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = GraphClient::new(make_settings(&server)).unwrap();
    let event = make_template().render(&make_record("Reacher"));
    let err = client
        .create_event(&AccessToken::new("token-123"), &event)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Calendar(_)), "{err}");
    assert!(err.to_string().contains("500"));
}

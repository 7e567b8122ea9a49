// Integration tests for `AdminClient` using wiremock.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use uuid::Uuid;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use opsdeck_api::models::{Ack, AdminUser, AlertRecord, SystemMetrics, UserRole};
use opsdeck_api::{AdminClient, Error, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, AdminClient) {
    let server = MockServer::start().await;
    let base = Url::parse(&server.uri()).unwrap();
    let client = AdminClient::new(base, &TransportConfig::default()).unwrap();
    (server, client)
}

fn user_json(name: &str, role: &str) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase()),
        "role": role,
        "active": true,
        "createdAt": "2026-01-15T09:30:00Z"
    })
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn list_users_deserializes_payload() {
    let (server, client) = setup().await;

    let body = json!([
        user_json("Ada", "admin"),
        user_json("Brin", "staff"),
        user_json("Cole", "user"),
    ]);

    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let users: Vec<AdminUser> = client.list_users().await.unwrap();

    assert_eq!(users.len(), 3);
    assert_eq!(users[0].name, "Ada");
    assert_eq!(users[0].role, UserRole::Admin);
    assert_eq!(users[2].role, UserRole::User);
}

#[tokio::test]
async fn bearer_token_is_attached_when_set() {
    let (server, client) = setup().await;
    client.set_token(SecretString::from("tok-abc".to_string()));

    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .and(header("authorization", "Bearer tok-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let users: Vec<AdminUser> = client.list_users().await.unwrap();
    assert!(users.is_empty());
}

#[tokio::test]
async fn list_alerts_with_limit_query() {
    let (server, client) = setup().await;

    let body = json!([{
        "id": Uuid::new_v4(),
        "severity": "high",
        "type": "brute_force",
        "message": "12 failed logins for admin@example.com",
        "source": "auth",
        "timestamp": "2026-08-26T10:00:00Z",
        "resolved": false
    }]);

    Mock::given(method("GET"))
        .and(path("/admin/security/alerts"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let alerts: Vec<AlertRecord> = client.list_security_alerts(Some(50)).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, "high");
    assert_eq!(alerts[0].alert_type, "brute_force");
    assert!(!alerts[0].resolved);
}

#[tokio::test]
async fn system_metrics_roundtrip() {
    let (server, client) = setup().await;

    let body = json!({
        "status": "warning",
        "cpuPercent": 78.4,
        "memoryPercent": 61.2,
        "memoryUsedMb": 1843.5,
        "diskPercent": 44.0,
        "uptimeSecs": 86400,
        "activeConnections": 23,
        "timestamp": "2026-08-26T10:05:00Z"
    });

    Mock::given(method("GET"))
        .and(path("/admin/system/metrics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let metrics: SystemMetrics = client.system_metrics().await.unwrap();
    assert_eq!(metrics.status, "warning");
    assert_eq!(metrics.active_connections, 23);
}

#[tokio::test]
async fn ack_envelope_on_write() {
    let (server, client) = setup().await;
    let id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path(format!("/admin/security/alerts/{id}/resolve")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "alert resolved"
        })))
        .mount(&server)
        .await;

    let ack: Ack = client.resolve_alert(&id).await.unwrap();
    assert!(ack.success);
    assert_eq!(ack.message, "alert resolved");
}

// ── Error-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn server_error_message_is_extracted() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "message": "database unavailable" })),
        )
        .mount(&server)
        .await;

    let err = client.list_users().await.unwrap_err();
    assert!(err.is_transient());
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "database unavailable");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_error_body_falls_back_to_status_line() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway (nginx)"))
        .mount(&server)
        .await;

    let err = client.list_users().await.unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 502);
            assert_eq!(message, "HTTP 502: Bad Gateway");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_maps_to_session_expired() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "token expired" })),
        )
        .mount(&server)
        .await;

    let err = client.list_users().await.unwrap_err();
    assert!(matches!(err, Error::SessionExpired));
    assert!(err.is_session_invalid());
    assert!(!err.is_transient());
}

#[tokio::test]
async fn validation_errors_are_structured() {
    let (server, client) = setup().await;
    let id = Uuid::new_v4();

    Mock::given(method("PUT"))
        .and(path(format!("/admin/users/{id}")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "validation failed",
            "errors": [
                { "field": "email", "message": "invalid email address" },
                { "field": "role", "message": "unknown role" }
            ]
        })))
        .mount(&server)
        .await;

    let err = client
        .update_user(&id, &opsdeck_api::models::UserUpdate::default())
        .await
        .unwrap_err();

    match err {
        Error::Validation { errors } => {
            assert_eq!(errors.len(), 2);
            assert_eq!(errors[0].field.as_deref(), Some("email"));
            assert_eq!(errors[1].message, "unknown role");
        }
        other => panic!("expected Validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_success_body_is_a_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = client.list_users().await.unwrap_err();
    match err {
        Error::Deserialization { body, .. } => assert!(body.contains("not json")),
        other => panic!("expected Deserialization error, got {other:?}"),
    }
}

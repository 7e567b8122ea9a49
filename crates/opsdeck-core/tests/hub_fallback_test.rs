// End-to-end tests for hub data loading with the sample-data fallback.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use opsdeck_core::model::UserRole;
use opsdeck_core::{AdminHub, DataOrigin, HubConfig};

async fn hub_for(server: &MockServer) -> AdminHub {
    let config = HubConfig {
        api_base: server.uri().parse().unwrap(),
        ..HubConfig::default()
    };
    AdminHub::new(config).unwrap()
}

#[tokio::test]
async fn failed_user_load_degrades_to_sample_users() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "database unavailable"
        })))
        .mount(&server)
        .await;

    let hub = hub_for(&server).await;
    let users = hub.load_users().await;

    assert_eq!(users.origin, DataOrigin::Fallback);
    assert_eq!(users.data.len(), 3);
    assert_eq!(
        users
            .data
            .iter()
            .filter(|u| u.role == UserRole::Admin)
            .count(),
        1
    );

    // The snapshot cell holds the degraded data too.
    let held = hub.users().latest().unwrap();
    assert_eq!(held.value.len(), 3);
}

#[tokio::test]
async fn successful_user_load_is_marked_live() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": Uuid::new_v4(),
            "name": "Avery Quinn",
            "email": "avery@example.com",
            "role": "admin",
            "active": true,
            "createdAt": "2026-01-15T09:30:00Z"
        }])))
        .mount(&server)
        .await;

    let hub = hub_for(&server).await;
    let users = hub.load_users().await;

    assert_eq!(users.origin, DataOrigin::Live);
    assert_eq!(users.data.len(), 1);
    assert_eq!(users.data[0].name, "Avery Quinn");
}

#[tokio::test]
async fn failed_metrics_load_degrades_to_sample_metrics() {
    let server = MockServer::start().await;
    // No mock mounted: the request 404s, which is still an API error.

    let hub = hub_for(&server).await;
    let metrics = hub.load_metrics().await;

    assert_eq!(metrics.origin, DataOrigin::Fallback);
    assert!(metrics.data.cpu_percent > 0.0);
    assert!(hub.metrics().latest().is_some());
}

#[tokio::test]
async fn failed_alert_load_fills_feed_with_samples() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/security/alerts"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let hub = hub_for(&server).await;
    let loaded = hub.load_alerts(None).await;

    assert_eq!(loaded.origin, DataOrigin::Fallback);
    assert_eq!(loaded.data, 4);
    assert_eq!(hub.alerts().len(), 4);
    assert_eq!(hub.alerts().unresolved().len(), 4);
}

#[tokio::test]
async fn fresher_load_replaces_older_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let hub = hub_for(&server).await;
    hub.load_users().await;
    let first = hub.users().latest().unwrap();

    hub.load_users().await;
    let second = hub.users().latest().unwrap();

    assert!(second.seq > first.seq);
}

#[tokio::test]
async fn resolve_alert_mirrors_into_feed() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/admin/security/alerts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": id,
            "severity": "high",
            "type": "brute_force",
            "message": "failed logins",
            "source": "auth",
            "timestamp": "2026-02-01T12:00:00Z",
            "resolved": false
        }])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/admin/security/alerts/{id}/resolve")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "resolved"
        })))
        .mount(&server)
        .await;

    let hub = hub_for(&server).await;
    let loaded = hub.load_alerts(None).await;
    assert_eq!(loaded.origin, DataOrigin::Live);
    assert_eq!(hub.alerts().unresolved().len(), 1);

    hub.resolve_alert(id).await.unwrap();
    assert_eq!(hub.alerts().unresolved().len(), 0);
    assert_eq!(hub.alerts().len(), 1); // resolved, not removed
}

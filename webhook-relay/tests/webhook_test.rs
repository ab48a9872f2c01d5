//! Integration tests for the `/webhook` endpoint.
//!
//! Each test builds its own router and sink, so tests never observe each
//! other's events.

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use webhook_relay::{create_router, AppState, Config, Event, EventSink, Forwarder};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

fn app_with(config: Config) -> (Router, EventSink) {
    let sink = EventSink::new();
    let forwarder = Forwarder::new().expect("create forwarder");
    let state = AppState::new(config, sink.clone(), forwarder);
    (create_router(state), sink)
}

fn app() -> (Router, EventSink) {
    app_with(Config::default())
}

async fn post_webhook(app: Router, body: impl Into<Body>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .body(body.into())
        .expect("build request");

    let response = app.oneshot(request).await.expect("failed to make request");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("read body").to_bytes();
    let json = serde_json::from_slice(&bytes).expect("response is JSON");
    (status, json)
}

fn valid_payload() -> Value {
    json!({
        "event_id": 123,
        "timestamp": "2023-10-05T12:34:56",
        "event_type": "test",
        "description": "Test webhook",
    })
}

#[tokio::test]
async fn valid_payload_is_accepted_and_recorded() {
    let (app, sink) = app();

    let (status, body) = post_webhook(app, valid_payload().to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success", "event_id": 123}));

    let events = sink.all().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_id(), 123);
    assert_eq!(events[0].timestamp().to_string(), "2023-10-05T12:34:56");
}

#[tokio::test]
async fn missing_fields_are_rejected_without_recording() {
    let (app, sink) = app();

    let payload = json!({"event_id": 123, "event_type": "test"});
    let (status, body) = post_webhook(app, payload.to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");

    let fields: Vec<&str> = body["errors"]
        .as_array()
        .expect("errors array")
        .iter()
        .map(|e| e["field"].as_str().expect("field name"))
        .collect();
    assert_eq!(fields, vec!["timestamp", "description"]);
    assert_eq!(body["errors"][0]["kind"], "missing");

    assert!(sink.is_empty().await);
}

#[tokio::test]
async fn each_missing_field_is_rejected() {
    for missing in ["event_id", "timestamp", "event_type", "description"] {
        let (app, sink) = app();

        let mut payload = valid_payload();
        payload.as_object_mut().expect("object").remove(missing);

        let (status, body) = post_webhook(app, payload.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "missing {}", missing);
        assert_eq!(body["errors"][0]["field"], missing);
        assert!(sink.is_empty().await);
    }
}

#[tokio::test]
async fn extra_field_is_rejected() {
    let (app, sink) = app();

    let mut payload = valid_payload();
    payload["priority"] = json!("high");

    let (status, body) = post_webhook(app, payload.to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "status": "error",
            "errors": [{
                "field": "priority",
                "kind": "extra_forbidden",
                "message": "extra inputs are not permitted",
            }],
        })
    );
    assert!(sink.is_empty().await);
}

#[tokio::test]
async fn large_valid_payload_is_accepted() {
    let (app, sink) = app();

    let description = "x".repeat(3 * 1024 * 1024);
    let mut payload = valid_payload();
    payload["description"] = json!(description);

    let (status, body) = post_webhook(app, payload.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success", "event_id": 123}));

    let events = sink.all().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].description().len(), 3 * 1024 * 1024);
}

#[tokio::test]
async fn invalid_json_is_malformed() {
    let (app, sink) = app();

    let (status, body) = post_webhook(app, "{\"event_id\": 123,").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert!(body["message"].is_string());
    assert!(body.get("errors").is_none());
    assert!(sink.is_empty().await);
}

#[tokio::test]
async fn empty_body_is_malformed() {
    let (app, sink) = app();

    let (status, body) = post_webhook(app, Body::empty()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert!(body["message"].is_string());
    assert!(sink.is_empty().await);
}

#[tokio::test]
async fn same_payload_twice_yields_two_events() {
    let (app, sink) = app();

    for _ in 0..2 {
        let (status, body) = post_webhook(app.clone(), valid_payload().to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["event_id"], 123);
    }

    let events = sink.all().await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], events[1]);
}

#[tokio::test]
async fn events_endpoint_lists_in_arrival_order() {
    let (app, _sink) = app();

    for id in [3, 1, 2] {
        let mut payload = valid_payload();
        payload["event_id"] = json!(id);
        let (status, _) = post_webhook(app.clone(), payload.to_string()).await;
        assert_eq!(status, StatusCode::OK);
    }

    let request = Request::builder()
        .uri("/events")
        .body(Body::empty())
        .expect("build request");
    let response = app.oneshot(request).await.expect("failed to make request");
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.expect("read body").to_bytes();
    let body: Value = serde_json::from_slice(&bytes).expect("response is JSON");

    assert_eq!(body["status"], "success");
    assert_eq!(body["count"], 3);
    let ids: Vec<i64> = body["events"]
        .as_array()
        .expect("events array")
        .iter()
        .map(|e| e["event_id"].as_i64().expect("event id"))
        .collect();
    assert_eq!(ids, vec![3, 1, 2]);

    let first: Event = serde_json::from_value(body["events"][0].clone()).expect("valid event");
    assert_eq!(first.event_type(), "test");
}

#[tokio::test]
async fn health_check_reports_ok() {
    let (app, _sink) = app();

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("build request");
    let response = app.oneshot(request).await.expect("failed to make request");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.expect("read body").to_bytes();
    assert_eq!(&bytes[..], br#"{"status":"ok"}"#);
}

#[tokio::test]
async fn receipt_does_not_forward_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (app, sink) = app();
    let (status, _) = post_webhook(app, valid_payload().to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(sink.len().await, 1);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(server.received_requests().await.expect("recording enabled").is_empty());
}

#[tokio::test]
async fn configured_alert_target_receives_accepted_events() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/client-webhook"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "received"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        alert_target_url: Some(format!("{}/client-webhook", server.uri())),
        ..Config::default()
    };
    let (app, sink) = app_with(config);

    let (status, _) = post_webhook(app.clone(), valid_payload().to_string()).await;
    assert_eq!(status, StatusCode::OK);

    // Rejected payloads are never forwarded.
    let (status, _) = post_webhook(app, json!({"event_id": 1}).to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut received = Vec::new();
    for _ in 0..50 {
        received = server.received_requests().await.expect("recording enabled");
        if !received.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(received.len(), 1);
    let sent: Value = serde_json::from_slice(&received[0].body).expect("JSON body");
    assert_eq!(sent["event_id"], 123);
    assert_eq!(sent["timestamp"], "2023-10-05T12:34:56");
    assert_eq!(sink.len().await, 1);
}

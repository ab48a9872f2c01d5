//! Integration tests for alert forwarding against a mock customer endpoint.

use std::time::{Duration, Instant};

use serde_json::{json, Value};
use webhook_relay::{validate_payload, Forwarder};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Mock customer endpoint answering `{"status": "received"}`.
async fn customer_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/client-webhook"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "received"})))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn alert_triggers_single_client_post() {
    let server = customer_server().await;

    let event = validate_payload(&json!({
        "event_id": 789,
        "timestamp": "2023-10-05T12:34:56",
        "event_type": "alert",
        "description": "Customer endpoint test",
    }))
    .expect("valid payload");

    let forwarder = Forwarder::new().expect("create forwarder");
    let target_url = format!("{}/client-webhook", server.uri());

    let started = Instant::now();
    let response = forwarder
        .forward(&event, &target_url)
        .await
        .expect("forward succeeds");
    let elapsed = started.elapsed();

    assert_eq!(response.status, 200);
    let data: Value = response.json().expect("JSON response");
    assert_eq!(data["status"], "received");

    let received = server.received_requests().await.expect("recording enabled");
    assert_eq!(received.len(), 1, "Expected exactly one alert");

    let sent: Value = serde_json::from_slice(&received[0].body).expect("JSON body");
    assert_eq!(sent["event_id"], event.event_id());
    assert!(elapsed < Duration::from_millis(500), "forward took {:?}", elapsed);
}

#[tokio::test]
async fn forwarded_body_reparses_to_the_same_event() {
    let server = customer_server().await;

    let event = validate_payload(&json!({
        "event_id": "42",
        "timestamp": "2023-10-05 12:34:56.789Z",
        "event_type": "alert",
        "description": "",
    }))
    .expect("valid payload");

    let forwarder = Forwarder::new().expect("create forwarder");
    forwarder
        .forward(&event, &format!("{}/client-webhook", server.uri()))
        .await
        .expect("forward succeeds");

    let received = server.received_requests().await.expect("recording enabled");
    let sent: Value = serde_json::from_slice(&received[0].body).expect("JSON body");

    assert_eq!(sent["event_id"], 42);
    assert_eq!(sent["timestamp"], "2023-10-05T12:34:56.789000+00:00");
    assert_eq!(validate_payload(&sent).expect("reparses"), event);
}

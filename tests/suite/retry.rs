//! Retry behaviour seen through the resource API.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use evolution_sdk::api::message::SendText;
use evolution_sdk::ErrorKind;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::common::{failing_then, retrying_client_for};

fn hello() -> SendText {
    SendText::new("5511999999999", "Hello!")
}

#[tokio::test]
async fn test_transient_failures_then_success() {
    let server = MockServer::start().await;
    let calls = Arc::new(AtomicU32::new(0));
    Mock::given(method("POST"))
        .and(path("/message/sendText/demo"))
        .respond_with(failing_then(calls.clone(), 2, 503, json!({"key": {"id": "ABC123"}})))
        .mount(&server)
        .await;

    let client = retrying_client_for(&server, 3);
    let sent = client
        .messages()
        .send_text("demo", hello())
        .await
        .expect("send should succeed after retries");

    assert_eq!(sent.message_id(), Some("ABC123"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retries_exhausted() {
    let server = MockServer::start().await;
    let calls = Arc::new(AtomicU32::new(0));
    Mock::given(method("POST"))
        .and(path("/message/sendText/demo"))
        .respond_with(failing_then(calls.clone(), 3, 500, json!({})))
        .mount(&server)
        .await;

    let client = retrying_client_for(&server, 2);
    let err = client.messages().send_text("demo", hello()).await.unwrap_err();

    assert!(matches!(err.kind, ErrorKind::Server { status: 500, .. }));
    assert!(err.is_message_error());
    assert_eq!(err.attempts, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_not_found_is_immediate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/instance/connectionState/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status": 404,
            "error": "Not Found",
            "response": {"message": ["The \"ghost\" instance does not exist"]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = retrying_client_for(&server, 3);
    let err = client.instance().connection_state("ghost").await.unwrap_err();

    assert!(matches!(err.kind, ErrorKind::NotFound(_)));
    assert!(err.is_instance_error());
    assert_eq!(err.attempts, 1);
}

#[tokio::test]
async fn test_retry_after_is_honoured() {
    let server = MockServer::start().await;
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    Mock::given(method("POST"))
        .and(path("/message/sendText/demo"))
        .respond_with(move |_: &wiremock::Request| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                ResponseTemplate::new(429).insert_header("Retry-After", "1")
            } else {
                ResponseTemplate::new(201).set_body_json(json!({"key": {"id": "LATE"}}))
            }
        })
        .mount(&server)
        .await;

    let client = retrying_client_for(&server, 1);
    let started = Instant::now();
    let sent = client
        .messages()
        .send_text("demo", hello())
        .await
        .expect("send should succeed after the rate limit");

    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(sent.message_id(), Some("LATE"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_validation_errors_are_never_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/message/sendText/demo"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": 400,
            "error": "Bad Request",
            "response": {"message": [{"exists": false, "jid": "5511000000000@s.whatsapp.net", "number": "5511000000000"}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = retrying_client_for(&server, 3);
    let err = client
        .messages()
        .send_text("demo", SendText::new("5511000000000", "Hello!"))
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.violations()[0].field, "number");
}

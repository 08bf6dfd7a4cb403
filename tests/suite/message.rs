//! Sending messages against a mock server.

use evolution_sdk::api::message::{SendOptions, SendText};
use futures::future::join_all;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::common::client_for;

#[tokio::test]
async fn test_send_text_returns_message_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/message/sendText/demo"))
        .and(body_partial_json(json!({"number": "5511999999999", "text": "Hello!", "delay": 1200})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"key": {"id": "ABC123"}})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let sent = client
        .messages()
        .send_text(
            "demo",
            SendText::new("5511999999999", "Hello!").with_options(SendOptions::default().with_delay(1200)),
        )
        .await
        .expect("send_text should succeed");

    assert_eq!(sent.message_id(), Some("ABC123"));
    assert!(sent.is_success());
}

#[tokio::test]
async fn test_send_text_without_key_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/message/sendText/demo"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"status": "PENDING"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let sent = client
        .messages()
        .send_text("demo", SendText::new("5511999999999", "Hello!"))
        .await
        .expect("a reply without a key still parses");

    assert_eq!(sent.message_id(), None);
    assert!(!sent.is_success());
}

#[tokio::test]
async fn test_concurrent_sends_share_one_client() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/message/sendText/demo"))
        .respond_with(|request: &wiremock::Request| {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap_or_default();
            let id = format!("ID-{}", body["text"].as_str().unwrap_or_default());
            ResponseTemplate::new(201).set_body_json(json!({"key": {"id": id}}))
        })
        .expect(10)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let sends = (0..10).map(|i| {
        let client = client.clone();
        async move {
            client
                .messages()
                .send_text("demo", SendText::new("5511999999999", i.to_string()))
                .await
        }
    });
    let results = join_all(sends).await;

    for (i, result) in results.into_iter().enumerate() {
        let sent = result.expect("every send should succeed");
        assert_eq!(sent.message_id(), Some(format!("ID-{i}").as_str()));
    }
}

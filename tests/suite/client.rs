//! Client construction, credentials and health checks.

use std::time::Duration;

use evolution_sdk::api::message::SendText;
use evolution_sdk::{ClientConfig, ErrorKind, EvolutionClient};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::common::{client_for, init_tracing};

#[tokio::test]
async fn test_missing_api_key_fails_before_sending() {
    init_tracing();
    let server = MockServer::start().await;
    let client = EvolutionClient::new(
        ClientConfig::builder(server.uri())
            .with_default_instance("demo")
            .without_retry()
            .build(),
    )
    .expect("client builds");

    let err = client
        .messages()
        .send_text("demo", SendText::new("5511999999999", "Hello!"))
        .await
        .unwrap_err();

    assert!(matches!(err.kind, ErrorKind::AuthenticationConfig(_)));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_instance_token_is_used_for_its_instance() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/instance/connectionState/sales"))
        .and(header("apikey", "sales-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "instance": {"instanceName": "sales", "state": "open"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = EvolutionClient::new(
        ClientConfig::builder(server.uri())
            .with_api_key("global-key")
            .with_instance_token("sales", "sales-token")
            .without_retry()
            .build(),
    )
    .expect("client builds");

    let state = client
        .instance()
        .connection_state("sales")
        .await
        .expect("connection_state should succeed");
    assert!(state.is_open());
}

#[tokio::test]
async fn test_forbidden_maps_to_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/instance/delete/demo"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "status": 403, "error": "Forbidden", "response": {"message": ["Missing global api key"]}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.instance().delete("demo").await.unwrap_err();

    assert!(matches!(err.kind, ErrorKind::Authorization(_)));
    assert!(err.is_instance_error());
    assert_eq!(err.status(), Some(403));
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 200, "message": "Welcome to the Evolution API, it is working!", "version": "2.1.1"
        })))
        .mount(&server)
        .await;

    assert!(client_for(&server).health_check().await);
}

#[tokio::test]
async fn test_health_check_unreachable() {
    init_tracing();
    // Port 9 (discard) is closed on test machines.
    let client = EvolutionClient::new(
        ClientConfig::builder("http://127.0.0.1:9")
            .with_api_key("test-key")
            .with_connect_timeout(Duration::from_millis(500))
            .with_timeout(Duration::from_secs(1))
            .build(),
    )
    .expect("client builds");

    assert!(!client.health_check().await);
}

#[tokio::test]
async fn test_scoped_client() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/instance/fetchInstances"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "demo", "connectionStatus": "open"},
            {"name": "sales", "connectionStatus": "close"}
        ])))
        .mount(&server)
        .await;

    let config = super::common::config_for(&server, evolution_sdk::client::RetryConfig::no_retry());
    let connected = EvolutionClient::scope(config, |client| async move {
        let instances = client.instance().fetch_instances(&Default::default()).await?;
        Ok(instances.iter().filter(|i| i.is_connected()).count())
    })
    .await
    .expect("scope should succeed");

    assert_eq!(connected, 1);
}

#[tokio::test]
async fn test_cancellation_aborts_in_flight_send() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/message/sendText/demo"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"key": {"id": "LATE"}}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let token = tokio_util::sync::CancellationToken::new();
    let client = client_for(&server).with_cancellation(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let started = std::time::Instant::now();
    let err = client
        .messages()
        .send_text("demo", SendText::new("5511999999999", "Hello!"))
        .await
        .unwrap_err();
    canceller.await.expect("canceller task finishes");

    assert!(matches!(err.kind, ErrorKind::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(2));
}

//! Instance lifecycle against a mock server.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use evolution_sdk::api::instance::{
    ConnectionState, CreateInstance, FetchInstancesFilter, InstanceStatus,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::common::client_for;

#[tokio::test]
async fn test_create_instance_returns_qr() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/instance/create"))
        .and(header("apikey", "test-key"))
        .and(body_json(json!({
            "instanceName": "demo",
            "qrcode": true,
            "integration": "WHATSAPP-BAILEYS"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "instance_name": "demo",
            "status": "connecting",
            "qrcode": {"base64": "Zm9v", "count": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let created = client
        .instance()
        .create("demo", CreateInstance::new())
        .await
        .expect("create should succeed");

    assert_eq!(created.instance_name(), Some("demo"));
    assert_eq!(created.instance_status(), Some(&InstanceStatus::Connecting));
    assert_eq!(created.qr_base64(), Some("Zm9v"));
}

#[tokio::test]
async fn test_unknown_status_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/instance/fetchInstances"))
        .and(query_param("instanceName", "demo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "demo", "connectionStatus": "refused"}
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let instances = client
        .instance()
        .fetch_instances(&FetchInstancesFilter::by_name("demo"))
        .await
        .expect("fetch_instances should succeed");

    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].status, Some(InstanceStatus::Unknown("refused".into())));
    assert!(!instances[0].is_connected());
}

#[tokio::test]
async fn test_wait_until_connected() {
    let server = MockServer::start().await;
    let polls = Arc::new(AtomicU32::new(0));
    let counter = polls.clone();
    Mock::given(method("GET"))
        .and(path("/instance/connectionState/demo"))
        .respond_with(move |_: &wiremock::Request| {
            let state = if counter.fetch_add(1, Ordering::SeqCst) < 2 { "connecting" } else { "open" };
            ResponseTemplate::new(200).set_body_json(json!({
                "instance": {"instanceName": "demo", "state": state}
            }))
        })
        .mount(&server)
        .await;

    let client = client_for(&server);
    let reached = client
        .instance()
        .wait_for_state("demo", ConnectionState::Open, Duration::from_secs(5), Duration::from_millis(10))
        .await
        .expect("wait_for_state should succeed");

    assert!(reached);
    assert_eq!(polls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_wait_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/instance/connectionState/demo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "instance": {"instanceName": "demo", "state": "close"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let reached = client
        .instance()
        .wait_for_state("demo", ConnectionState::Open, Duration::from_millis(100), Duration::from_millis(20))
        .await
        .expect("wait_for_state should not fail on timeout");

    assert!(!reached);
}

//! The blocking client, driven from a plain thread.

use evolution_sdk::api::message::SendText;
use evolution_sdk::blocking::EvolutionClient;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::common::config_for;

#[test]
fn test_blocking_client_mirrors_async_calls() {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/instance/create"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "instance": {"instanceName": "demo", "status": "created"},
                "hash": "4e1a5f",
                "qrcode": {"code": "2@abc", "base64": "Zm9v", "count": "1"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/message/sendText/demo"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"key": {"id": "ABC123"}})))
            .mount(&server)
            .await;
        server
    });
    let config = config_for(&server, evolution_sdk::client::RetryConfig::no_retry());

    std::thread::spawn(move || {
        let client = EvolutionClient::new(config).expect("client builds");

        let created = client
            .instance()
            .create("demo", Default::default())
            .expect("create should succeed");
        assert_eq!(created.qr_base64(), Some("Zm9v"));
        assert_eq!(created.token(), Some("4e1a5f"));

        let sent = client
            .messages()
            .send_text("demo", SendText::new("5511999999999", "Hello!"))
            .expect("send_text should succeed");
        assert!(sent.is_success());
        client.close();
    })
    .join()
    .expect("blocking thread");
}

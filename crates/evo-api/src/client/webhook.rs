use serde::Serialize;
use serde_json::{Map, Value};
use tracing::instrument;

use evolution_sdk_client::{ApiFamily, RequestBuilder, Result};

use super::{target, EvolutionClient};
use crate::fields::{parse, FromResponse};
use crate::validate::Validator;
use crate::webhook::{
    EventStreamConfig, RabbitmqConfig, SqsConfig, WebhookConfig, WebsocketConfig, WrappedRabbitmq,
    WrappedSqs, WrappedWebsocket,
};

const FAMILY: ApiFamily = ApiFamily::Webhook;

/// Where an instance delivers its events: an HTTP webhook, a websocket,
/// RabbitMQ or SQS.
#[derive(Debug, Clone, Copy)]
pub struct WebhookApi<'a> {
    client: &'a EvolutionClient,
}

impl<'a> WebhookApi<'a> {
    pub(crate) fn new(client: &'a EvolutionClient) -> Self {
        Self { client }
    }

    /// Register or replace the HTTP webhook.
    #[instrument(skip(self, config), fields(enabled = config.enabled))]
    pub async fn set_webhook(&self, instance: &str, config: &WebhookConfig) -> Result<WebhookConfig> {
        let mut check = Validator::new();
        check.instance(target(instance));
        if config.enabled {
            check
                .http_url("webhook.url", &config.url)
                .not_empty_list("webhook.events", &config.events);
        }
        check.finish().map_err(|e| e.in_family(FAMILY))?;

        self.set(instance, "webhook", config).await
    }

    #[instrument(skip(self))]
    pub async fn find_webhook(&self, instance: &str) -> Result<WebhookConfig> {
        self.find(instance, "webhook").await
    }

    #[instrument(skip(self, config), fields(enabled = config.enabled))]
    pub async fn set_websocket(&self, instance: &str, config: &WebsocketConfig) -> Result<WebsocketConfig> {
        self.set_stream::<WrappedWebsocket>(instance, "websocket", config).await
    }

    #[instrument(skip(self))]
    pub async fn find_websocket(&self, instance: &str) -> Result<WebsocketConfig> {
        let found: WrappedWebsocket = self.find(instance, "websocket").await?;
        Ok(found.0)
    }

    #[instrument(skip(self, config), fields(enabled = config.enabled))]
    pub async fn set_rabbitmq(&self, instance: &str, config: &RabbitmqConfig) -> Result<RabbitmqConfig> {
        self.set_stream::<WrappedRabbitmq>(instance, "rabbitmq", config).await
    }

    #[instrument(skip(self))]
    pub async fn find_rabbitmq(&self, instance: &str) -> Result<RabbitmqConfig> {
        let found: WrappedRabbitmq = self.find(instance, "rabbitmq").await?;
        Ok(found.0)
    }

    #[instrument(skip(self, config), fields(enabled = config.enabled))]
    pub async fn set_sqs(&self, instance: &str, config: &SqsConfig) -> Result<SqsConfig> {
        self.set_stream::<WrappedSqs>(instance, "sqs", config).await
    }

    #[instrument(skip(self))]
    pub async fn find_sqs(&self, instance: &str) -> Result<SqsConfig> {
        let found: WrappedSqs = self.find(instance, "sqs").await?;
        Ok(found.0)
    }

    async fn set_stream<W>(&self, instance: &str, kind: &str, config: &EventStreamConfig) -> Result<EventStreamConfig>
    where
        W: FromResponse + Into<EventStreamConfig>,
    {
        let mut check = Validator::new();
        check.instance(target(instance));
        if config.enabled {
            check.not_empty_list(&format!("{kind}.events"), &config.events);
        }
        check.finish().map_err(|e| e.in_family(FAMILY))?;

        let value = self.send_set(instance, kind, config).await?;
        // Some server versions answer with an empty body.
        if value.is_null() {
            return Ok(config.clone());
        }
        let saved: W = parse(&value).map_err(|e| e.in_family(FAMILY))?;
        Ok(saved.into())
    }

    /// `POST /<kind>/set/{instance}` with the config under a `<kind>` key.
    async fn set<T, R>(&self, instance: &str, kind: &str, config: &T) -> Result<R>
    where
        T: Serialize,
        R: FromResponse,
    {
        let value = self.send_set(instance, kind, config).await?;
        parse(&value).map_err(|e| e.in_family(FAMILY))
    }

    async fn send_set<T: Serialize>(&self, instance: &str, kind: &str, config: &T) -> Result<Value> {
        let mut body = Map::new();
        body.insert(kind.to_string(), serde_json::to_value(config)?);
        let request = RequestBuilder::post(format!("/{kind}/set/{{instance}}"))
            .maybe_instance(target(instance))
            .json_value(Value::Object(body));
        self.client.send(request, FAMILY).await
    }

    async fn find<R: FromResponse>(&self, instance: &str, kind: &str) -> Result<R> {
        let mut check = Validator::new();
        check.instance(target(instance));
        check.finish().map_err(|e| e.in_family(FAMILY))?;

        let request = RequestBuilder::get(format!("/{kind}/find/{{instance}}")).maybe_instance(target(instance));
        self.client.fetch(request, FAMILY).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::client_for;
    use crate::webhook::{EventStreamConfig, WebhookConfig, WebhookEvent};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_set_and_find_webhook_wiremock() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/set/demo"))
            .and(body_json(json!({
                "webhook": {
                    "enabled": true,
                    "url": "https://hooks.example.com/evo",
                    "headers": {"authorization": "Bearer abc"},
                    "byEvents": false,
                    "base64": true,
                    "events": ["MESSAGES_UPSERT", "CONNECTION_UPDATE"]
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "wh1",
                "url": "https://hooks.example.com/evo",
                "enabled": true,
                "events": ["MESSAGES_UPSERT", "CONNECTION_UPDATE"],
                "webhookByEvents": false,
                "webhookBase64": true
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/webhook/find/demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "enabled": true,
                "url": "https://hooks.example.com/evo",
                "events": ["MESSAGES_UPSERT", "GROUPS_REMOVE"]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let config = WebhookConfig::new(
            "https://hooks.example.com/evo",
            vec![WebhookEvent::MessagesUpsert, WebhookEvent::ConnectionUpdate],
        )
        .with_header("authorization", "Bearer abc")
        .with_base64(true);

        let saved = client
            .webhook()
            .set_webhook("demo", &config)
            .await
            .expect("set_webhook should succeed");
        assert!(saved.enabled);
        assert!(saved.base64);
        assert_eq!(saved.extra.get("id"), Some(&json!("wh1")));

        let found = client.webhook().find_webhook("demo").await.expect("find_webhook should succeed");
        assert_eq!(found.events[0], WebhookEvent::MessagesUpsert);
        assert!(found.events[1].is_unknown());
    }

    #[tokio::test]
    async fn test_webhook_url_is_checked() {
        let server = MockServer::start().await;
        let client = client_for(&server);

        let err = client
            .webhook()
            .set_webhook("demo", &WebhookConfig::new("not a url", vec![WebhookEvent::MessagesUpsert]))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.is_webhook_error());
        assert_eq!(err.violations()[0].field, "webhook.url");
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_event_streams_wiremock() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/websocket/set/demo"))
            .and(body_json(json!({"websocket": {"enabled": true, "events": ["QRCODE_UPDATED"]}})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "websocket": {"enabled": true, "events": ["QRCODE_UPDATED"]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rabbitmq/find/demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "enabled": false, "events": []
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/sqs/set/demo"))
            .and(body_json(json!({"sqs": {"enabled": false, "events": []}})))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sqs/find/demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sqs": {"enabled": true, "events": ["SEND_MESSAGE"]}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let hooks = client.webhook();

        let websocket = hooks
            .set_websocket("demo", &EventStreamConfig::new(vec![WebhookEvent::QrcodeUpdated]))
            .await
            .expect("set_websocket should succeed");
        assert!(websocket.enabled);
        assert_eq!(websocket.events, vec![WebhookEvent::QrcodeUpdated]);

        let rabbitmq = hooks.find_rabbitmq("demo").await.expect("find_rabbitmq should succeed");
        assert!(!rabbitmq.enabled);

        let sqs = hooks
            .set_sqs("demo", &EventStreamConfig::off())
            .await
            .expect("set_sqs should succeed");
        assert!(!sqs.enabled);

        let sqs = hooks.find_sqs("demo").await.expect("find_sqs should succeed");
        assert_eq!(sqs.events, vec![WebhookEvent::SendMessage]);
    }
}

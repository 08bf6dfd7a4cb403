use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;
use tracing::{debug, instrument};

use evolution_sdk_client::{ApiFamily, Error, ErrorKind, RequestBuilder, Result};

use super::{target, EvolutionClient};
use crate::ack::Ack;
use crate::chat::Presence;
use crate::instance::{
    ConnectionState, ConnectionStateResponse, CreateInstance, FetchInstancesFilter, Instance,
    InstanceResponse, InstanceSettings,
};
use crate::validate::Validator;

const FAMILY: ApiFamily = ApiFamily::Instance;

/// Instance lifecycle: create, connect, inspect, restart, log out, delete.
#[derive(Debug, Clone, Copy)]
pub struct InstanceApi<'a> {
    client: &'a EvolutionClient,
}

impl<'a> InstanceApi<'a> {
    pub(crate) fn new(client: &'a EvolutionClient) -> Self {
        Self { client }
    }

    /// Create an instance.
    ///
    /// QR generation is on unless `options` turns it off; the response
    /// then carries the first QR code and the instance token.
    #[instrument(skip(self, options))]
    pub async fn create(&self, name: &str, options: CreateInstance) -> Result<InstanceResponse> {
        let mut check = Validator::new();
        check.required_name("instanceName", name);
        if let Some(number) = options.number.as_deref() {
            check.recipient("number", number);
        }
        check.finish().map_err(|e| e.in_family(FAMILY))?;

        let body = options.prepared(name.trim());
        let request = RequestBuilder::post("/instance/create").json(&body)?;
        self.client.fetch(request, FAMILY).await
    }

    /// List instances, optionally filtered by name or id.
    #[instrument(skip(self))]
    pub async fn fetch_instances(&self, filter: &FetchInstancesFilter) -> Result<Vec<Instance>> {
        let request = RequestBuilder::get("/instance/fetchInstances").query_params(filter)?;
        self.client.fetch_list(request, FAMILY).await
    }

    /// Start linking a device. Returns a fresh QR code, or a pairing code
    /// when `number` is given.
    #[instrument(skip(self))]
    pub async fn connect(&self, instance: &str, number: Option<&str>) -> Result<InstanceResponse> {
        let mut check = Validator::new();
        check.instance(target(instance));
        if let Some(number) = number {
            check.recipient("number", number);
        }
        check.finish().map_err(|e| e.in_family(FAMILY))?;

        let request = RequestBuilder::get("/instance/connect/{instance}")
            .maybe_instance(target(instance))
            .query_opt("number", number);
        self.client.fetch(request, FAMILY).await
    }

    /// Restart the WhatsApp session of an instance.
    #[instrument(skip(self))]
    pub async fn restart(&self, instance: &str) -> Result<InstanceResponse> {
        let request = self.instance_request(RequestBuilder::post("/instance/restart/{instance}"), instance)?;
        self.client.fetch(request, FAMILY).await
    }

    /// Current connection state of an instance.
    #[instrument(skip(self))]
    pub async fn connection_state(&self, instance: &str) -> Result<ConnectionStateResponse> {
        let request = self.instance_request(
            RequestBuilder::get("/instance/connectionState/{instance}"),
            instance,
        )?;
        self.client.fetch(request, FAMILY).await
    }

    /// Unlink the device. The instance itself is kept.
    #[instrument(skip(self))]
    pub async fn logout(&self, instance: &str) -> Result<Ack> {
        let request = self.instance_request(RequestBuilder::delete("/instance/logout/{instance}"), instance)?;
        self.client.fetch(request, FAMILY).await
    }

    /// Delete an instance.
    #[instrument(skip(self))]
    pub async fn delete(&self, instance: &str) -> Result<Ack> {
        let request = self.instance_request(RequestBuilder::delete("/instance/delete/{instance}"), instance)?;
        self.client.fetch(request, FAMILY).await
    }

    /// Set the global presence of the account.
    #[instrument(skip(self))]
    pub async fn set_presence(&self, instance: &str, presence: Presence) -> Result<Ack> {
        let request = self
            .instance_request(RequestBuilder::post("/instance/setPresence/{instance}"), instance)?
            .json(&json!({ "presence": presence }))?;
        self.client.fetch(request, FAMILY).await
    }

    /// Update instance behaviour settings.
    #[instrument(skip(self, settings))]
    pub async fn set_settings(&self, instance: &str, settings: &InstanceSettings) -> Result<InstanceSettings> {
        let request = self
            .instance_request(RequestBuilder::post("/settings/set/{instance}"), instance)?
            .json(settings)?;
        self.client.fetch(request, FAMILY).await
    }

    /// Read instance behaviour settings.
    #[instrument(skip(self))]
    pub async fn find_settings(&self, instance: &str) -> Result<InstanceSettings> {
        let request = self.instance_request(RequestBuilder::get("/settings/find/{instance}"), instance)?;
        self.client.fetch(request, FAMILY).await
    }

    /// Poll the connection state until it reaches `state`.
    ///
    /// Returns `Ok(true)` once the state matches and `Ok(false)` if
    /// `timeout` elapses first. Request errors end the wait.
    #[instrument(skip(self))]
    pub async fn wait_for_state(
        &self,
        instance: &str,
        state: ConnectionState,
        timeout: Duration,
        interval: Duration,
    ) -> Result<bool> {
        if interval.is_zero() {
            return Err(Error::new(ErrorKind::Config(
                "poll interval must be greater than zero".to_string(),
            ))
            .in_family(FAMILY));
        }

        // A timeout too large to represent waits without a deadline.
        let deadline = Instant::now().checked_add(timeout);
        loop {
            let current = self.connection_state(instance).await?;
            if current.state == state {
                return Ok(true);
            }
            debug!(current = %current.state, wanted = %state, "Instance not in wanted state yet");

            if let Some(deadline) = deadline {
                if deadline.saturating_duration_since(Instant::now()) < interval {
                    return Ok(false);
                }
            }
            match self.client.cancellation() {
                Some(token) => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => {
                            return Err(Error::new(ErrorKind::Cancelled).in_family(FAMILY));
                        }
                        _ = tokio::time::sleep(interval) => {}
                    }
                }
                None => tokio::time::sleep(interval).await,
            }
        }
    }

    fn instance_request(&self, request: RequestBuilder, instance: &str) -> Result<RequestBuilder> {
        Validator::new()
            .instance(target(instance))
            .finish()
            .map_err(|e| e.in_family(FAMILY))?;
        Ok(request.maybe_instance(target(instance)))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::client_for;
    use super::EvolutionClient;
    use crate::chat::Presence;
    use crate::instance::{
        ConnectionState, CreateInstance, FetchInstancesFilter, InstanceSettings, InstanceStatus,
    };
    use evolution_sdk_client::{ClientConfig, ErrorKind};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_create_instance_wiremock() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/instance/create"))
            .and(header("apikey", "test-key"))
            .and(body_partial_json(json!({
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
        assert_eq!(created.instance_status(), Some(&InstanceStatus::Connecting));
        assert_eq!(created.qr_base64(), Some("Zm9v"));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let server = MockServer::start().await;
        let client = client_for(&server);
        let err = client
            .instance()
            .create("  ", CreateInstance::new().with_number("abc"))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.is_instance_error());
        assert_eq!(err.violations().len(), 2);
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_instances_wiremock() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/instance/fetchInstances"))
            .and(query_param("instanceName", "bot1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "a1", "name": "bot1", "connectionStatus": "open", "token": "t1"}
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let instances = client
            .instances()
            .fetch_instances(&FetchInstancesFilter::by_name("bot1"))
            .await
            .expect("fetch_instances should succeed");
        assert_eq!(instances.len(), 1);
        assert!(instances[0].is_connected());
        assert_eq!(instances[0].token.as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn test_connect_uses_default_instance_and_number() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/instance/connect/demo"))
            .and(query_param("number", "5511999999999"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "pairingCode": "WZYEH1YY", "code": "2@abc", "count": 1
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let response = client
            .instance()
            .connect("", Some("5511999999999"))
            .await
            .expect("connect should succeed");
        assert_eq!(response.qr().and_then(|qr| qr.pairing_code()), Some("WZYEH1YY"));
    }

    #[tokio::test]
    async fn test_instance_name_is_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/instance/connectionState/my%20bot"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "instance": {"instanceName": "my bot", "state": "open"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let state = client
            .instance()
            .connection_state("my bot")
            .await
            .expect("connection_state should succeed");
        assert!(state.is_open());
    }

    #[tokio::test]
    async fn test_lifecycle_calls_wiremock() {
        let server = MockServer::start().await;
        let ack = json!({"status": "SUCCESS", "error": false, "response": {"message": "ok"}});
        Mock::given(method("POST"))
            .and(path("/instance/restart/demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "instance": {"instanceName": "demo", "state": "connecting"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/instance/logout/demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&ack))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/instance/delete/demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&ack))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/instance/setPresence/demo"))
            .and(body_json(json!({"presence": "unavailable"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(&ack))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let api = client.instance();
        let restarted = api.restart("demo").await.expect("restart should succeed");
        assert_eq!(
            restarted.instance.and_then(|i| i.state),
            Some(ConnectionState::Connecting)
        );
        assert!(api.logout("demo").await.expect("logout should succeed").is_ok());
        assert!(api.delete("demo").await.expect("delete should succeed").is_ok());
        assert!(api
            .set_presence("demo", Presence::Unavailable)
            .await
            .expect("set_presence should succeed")
            .is_ok());
    }

    #[tokio::test]
    async fn test_settings_wiremock() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/settings/set/demo"))
            .and(body_json(json!({"rejectCall": true, "msgCall": "busy"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "settings": {"instanceName": "demo", "settings": {"reject_call": true, "msg_call": "busy"}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/settings/find/demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "rejectCall": true, "msgCall": "busy", "groupsIgnore": false
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let settings = InstanceSettings {
            reject_call: Some(true),
            msg_call: Some("busy".into()),
            ..Default::default()
        };
        let saved = client
            .instance()
            .set_settings("demo", &settings)
            .await
            .expect("set_settings should succeed");
        assert_eq!(saved.reject_call, Some(true));
        assert_eq!(saved.msg_call.as_deref(), Some("busy"));

        let found = client.instance().find_settings("demo").await.expect("find_settings should succeed");
        assert_eq!(found.groups_ignore, Some(false));
    }

    #[tokio::test]
    async fn test_wait_for_state_reaches_target() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/instance/connectionState/demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": "connecting"})))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/instance/connectionState/demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": "open"})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let reached = client
            .instance()
            .wait_for_state("demo", ConnectionState::Open, Duration::from_secs(5), Duration::from_millis(20))
            .await
            .expect("wait should succeed");
        assert!(reached);
        assert_eq!(server.received_requests().await.map(|r| r.len()), Some(3));
    }

    #[tokio::test]
    async fn test_wait_for_state_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/instance/connectionState/demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": "close"})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let reached = client
            .instance()
            .wait_for_state("demo", ConnectionState::Open, Duration::from_millis(100), Duration::from_millis(30))
            .await
            .expect("wait should not fail");
        assert!(!reached);

        let err = client
            .instance()
            .wait_for_state("demo", ConnectionState::Open, Duration::from_secs(1), Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Config(_)));
    }

    #[tokio::test]
    async fn test_wait_for_state_with_huge_durations() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/instance/connectionState/demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": "connecting"})))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/instance/connectionState/demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": "open"})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let reached = client
            .instance()
            .wait_for_state("demo", ConnectionState::Open, Duration::MAX, Duration::from_millis(10))
            .await
            .expect("wait should succeed");
        assert!(reached);

        // The next poll would land past the deadline, so the wait ends after one check.
        let reached = client
            .instance()
            .wait_for_state("demo", ConnectionState::Close, Duration::from_millis(50), Duration::MAX)
            .await
            .expect("wait should not fail");
        assert!(!reached);
        assert_eq!(server.received_requests().await.map(|r| r.len()), Some(3));
    }

    #[tokio::test]
    async fn test_logout_with_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/instance/logout/demo"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/instance/delete/demo"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let ack = client.instance().logout("demo").await.expect("logout should succeed");
        assert!(ack.is_ok());
        assert!(ack.status.is_none());
        assert!(client.instance().delete("demo").await.expect("delete should succeed").is_ok());
    }

    #[tokio::test]
    async fn test_missing_instance_without_default() {
        let server = MockServer::start().await;
        let client = EvolutionClient::new(ClientConfig::builder(server.uri()).with_api_key("k").build())
            .expect("client builds");
        let err = client.instance().connection_state("").await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.violations()[0].field, "instance");
    }
}

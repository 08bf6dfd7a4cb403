//! Evolution API client.
//!
//! `EvolutionClient` wraps `EvolutionHttp` from `evolution-sdk-client` and
//! exposes the API as resource handles: instances, messages, chats, groups,
//! profile and event delivery configuration.

use std::future::Future;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use evolution_sdk_client::{ApiFamily, ClientConfig, EvolutionHttp, RequestBuilder, Result};

use crate::fields::{parse, parse_list, FromResponse};

mod chat;
mod group;
mod instance;
mod message;
mod profile;
mod webhook;

pub use chat::ChatApi;
pub use group::GroupApi;
pub use instance::InstanceApi;
pub use message::MessageApi;
pub use profile::ProfileApi;
pub use webhook::WebhookApi;

/// Evolution API client.
///
/// Cloning is cheap: clones share one connection pool. The pool is released
/// when the last clone is dropped.
///
/// # Example
///
/// ```rust,ignore
/// use evolution_sdk_api::{ClientConfig, EvolutionClient};
/// use evolution_sdk_api::message::SendText;
///
/// let client = EvolutionClient::new(
///     ClientConfig::builder("http://localhost:8080")
///         .with_api_key("B6D711FCDE4D4FD5936544120E713976")
///         .build(),
/// )?;
///
/// let created = client.instance().create("demo", Default::default()).await?;
/// println!("scan: {:?}", created.qr_base64());
///
/// let sent = client
///     .messages()
///     .send_text("demo", SendText::new("5511999999999", "Hello!"))
///     .await?;
/// assert!(sent.is_success());
/// ```
#[derive(Debug, Clone)]
pub struct EvolutionClient {
    http: EvolutionHttp,
    cancel: Option<CancellationToken>,
}

impl EvolutionClient {
    /// Create a client from a configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self::from_http(EvolutionHttp::new(config)?))
    }

    /// Create a client configured from `EVOLUTION_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Wrap an existing `EvolutionHttp`.
    pub fn from_http(http: EvolutionHttp) -> Self {
        Self { http, cancel: None }
    }

    /// Get the underlying `EvolutionHttp`.
    pub fn inner(&self) -> &EvolutionHttp {
        &self.http
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        self.http.config()
    }

    /// A clone whose calls abort when `token` is cancelled.
    ///
    /// Both in-flight attempts and backoff sleeps are interrupted and the
    /// call fails with `ErrorKind::Cancelled`.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            http: self.http.clone(),
            cancel: Some(token),
        }
    }

    /// The bound cancellation token, if any.
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    // =========================================================================
    // Resources
    // =========================================================================

    /// Instance lifecycle operations.
    pub fn instance(&self) -> InstanceApi<'_> {
        InstanceApi::new(self)
    }

    /// Alias of [`EvolutionClient::instance`].
    pub fn instances(&self) -> InstanceApi<'_> {
        self.instance()
    }

    /// Sending messages.
    pub fn messages(&self) -> MessageApi<'_> {
        MessageApi::new(self)
    }

    /// Alias of [`EvolutionClient::messages`].
    pub fn message(&self) -> MessageApi<'_> {
        self.messages()
    }

    /// Chats, contacts and message history.
    pub fn chat(&self) -> ChatApi<'_> {
        ChatApi::new(self)
    }

    /// Group management.
    pub fn group(&self) -> GroupApi<'_> {
        GroupApi::new(self)
    }

    /// Profile and privacy of the connected account.
    pub fn profile(&self) -> ProfileApi<'_> {
        ProfileApi::new(self)
    }

    /// Webhook, websocket, RabbitMQ and SQS configuration.
    pub fn webhook(&self) -> WebhookApi<'_> {
        WebhookApi::new(self)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Returns true if the server answers. Never fails.
    pub async fn health_check(&self) -> bool {
        self.http.health_check().await
    }

    /// Release this handle. The pool closes once every clone is gone.
    pub fn close(self) {
        debug!(base_url = %self.http.base_url(), "Closing Evolution client");
    }

    /// Run `f` with a fresh client and tear the client down afterwards.
    ///
    /// The client is dropped on every exit path, including errors from `f`
    /// and the returned future being dropped early.
    #[instrument(skip(config, f))]
    pub async fn scope<F, Fut, T>(config: ClientConfig, f: F) -> Result<T>
    where
        F: FnOnce(EvolutionClient) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let client = Self::new(config)?;
        f(client).await
    }

    // =========================================================================
    // Request plumbing shared by the resources
    // =========================================================================

    fn prepare(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.cancel {
            Some(token) => request.cancel_on(token.clone()),
            None => request,
        }
    }

    /// Execute and return the raw JSON, tagging errors with `family`.
    pub(crate) async fn send(&self, request: RequestBuilder, family: ApiFamily) -> Result<Value> {
        self.http
            .request(self.prepare(request))
            .await
            .map_err(|e| e.in_family(family))
    }

    /// Execute and read the response as one model.
    pub(crate) async fn fetch<T: FromResponse>(
        &self,
        request: RequestBuilder,
        family: ApiFamily,
    ) -> Result<T> {
        let value = self.send(request, family).await?;
        parse(&value).map_err(|e| e.in_family(family))
    }

    /// Execute and read the response as a list of models.
    pub(crate) async fn fetch_list<T: FromResponse>(
        &self,
        request: RequestBuilder,
        family: ApiFamily,
    ) -> Result<Vec<T>> {
        let value = self.send(request, family).await?;
        parse_list(&value).map_err(|e| e.in_family(family))
    }
}

/// A blank instance name means "use the default instance".
pub(crate) fn target(instance: &str) -> Option<&str> {
    let trimmed = instance.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::EvolutionClient;
    use evolution_sdk_client::ClientConfig;
    use wiremock::MockServer;

    /// Client against a mock server, with default instance "demo" and no retries.
    pub(crate) fn client_for(server: &MockServer) -> EvolutionClient {
        EvolutionClient::new(
            ClientConfig::builder(server.uri())
                .with_api_key("test-key")
                .with_default_instance("demo")
                .without_retry()
                .build(),
        )
        .expect("client builds")
    }
}

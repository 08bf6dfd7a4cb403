//! Authenticated Evolution API client with typed JSON helpers.
//!
//! `EvolutionHttp` combines the configured credentials with the HTTP
//! transport. Resource crates build a [`RequestBuilder`] per operation and
//! hand it to [`EvolutionHttp::request`].
//!
//! ## Security
//!
//! - API keys and instance tokens are redacted in Debug output
//! - Credentials are skipped in tracing spans

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;
use url::Url;

use crate::auth::AuthHandler;
use crate::client::HttpClient;
use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::request::RequestBuilder;
use crate::response::Response;

/// Authenticated client bound to one Evolution server.
///
/// # Example
///
/// ```rust,ignore
/// use evolution_sdk_client::{ClientConfig, EvolutionHttp, RequestBuilder};
///
/// let http = EvolutionHttp::new(ClientConfig::from_env()?)?;
/// let state = http
///     .request(RequestBuilder::get("/instance/connectionState/{instance}").instance("demo"))
///     .await?;
/// ```
#[derive(Clone)]
pub struct EvolutionHttp {
    http: HttpClient,
    base_url: Url,
    auth: AuthHandler,
}

impl std::fmt::Debug for EvolutionHttp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvolutionHttp")
            .field("base_url", &self.base_url.as_str())
            .field("auth", &self.auth)
            .field("default_instance", &self.default_instance())
            .finish_non_exhaustive()
    }
}

impl EvolutionHttp {
    /// Create a client from a configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = parse_base_url(&config.base_url)?;
        let auth = AuthHandler::from_config(&config);
        let http = HttpClient::new(config)?;
        Ok(Self {
            http,
            base_url,
            auth,
        })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        self.http.config()
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The instance used when a call does not name one.
    pub fn default_instance(&self) -> Option<&str> {
        self.http.config().default_instance.as_deref()
    }

    /// The auth handler in use.
    pub fn auth(&self) -> &AuthHandler {
        &self.auth
    }

    /// Build the full URL for a resolved path.
    pub fn url(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}")).map_err(Into::into)
    }

    /// Execute a request and return the checked response.
    #[instrument(skip(self, request), fields(method = ?request.method(), path = %request.path()))]
    pub async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let request = request.with_default_instance(self.default_instance());
        let path = request.resolved_path()?;
        let headers = self.auth.headers_for(
            request.instance.as_deref(),
            request.api_key.as_deref(),
            request.requires_auth,
        )?;
        let url = self.url(&path)?;
        self.http.execute(&url, &request, &headers).await
    }

    /// Execute a request and return the JSON body.
    ///
    /// An empty body yields `Value::Null`.
    pub async fn request(&self, request: RequestBuilder) -> Result<Value> {
        self.execute(request).await?.into_value()
    }

    /// Execute a request and deserialize the JSON body.
    pub async fn request_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.execute(request).await?.json()
    }

    /// Probe the server with a single `GET /`.
    ///
    /// Never fails: any error, including an unreachable host, yields false.
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn health_check(&self) -> bool {
        let request = RequestBuilder::get("/").optional_auth().no_retry();
        match self.execute(request).await {
            Ok(_) => true,
            Err(err) => {
                tracing::debug!(error = %err, "Health check failed");
                false
            }
        }
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::new(ErrorKind::Config(
            "base URL must not be empty".to_string(),
        )));
    }

    let url = Url::parse(trimmed)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::new(ErrorKind::Config(format!(
            "base URL must use http or https, got {other:?}"
        )))),
    }
}

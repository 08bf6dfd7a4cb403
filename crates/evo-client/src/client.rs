//! Core HTTP transport with retry, compression, and cancellation.

use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::request::{MultipartPart, RequestBody, RequestBuilder};
use crate::response::Response;
use crate::retry::{RetryConfig, RetryPolicy};

/// HTTP transport for the Evolution API with built-in retry and error mapping.
///
/// Cloning is cheap: clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    config: ClientConfig,
}

impl HttpClient {
    /// Create a new HTTP transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .gzip(config.accept_compressed)
            .deflate(config.accept_compressed);

        let inner = builder
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self { inner, config })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Execute a request with automatic retry handling.
    ///
    /// `auth_headers` are attached to every attempt. On failure the last
    /// mapped error is returned with the number of attempts recorded.
    #[instrument(skip(self, request, auth_headers), fields(method = ?request.method, path = %url.path()))]
    pub async fn execute(
        &self,
        url: &Url,
        request: &RequestBuilder,
        auth_headers: &[(&'static str, String)],
    ) -> Result<Response> {
        let retry = if request.retry {
            self.config.retry.clone()
        } else {
            RetryConfig::no_retry()
        };
        let mut policy = RetryPolicy::new(retry);
        let mut attempts = 0u32;

        loop {
            if request.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
                return Err(Error::new(ErrorKind::Cancelled).with_attempts(attempts));
            }

            attempts += 1;
            let result = match &request.cancel {
                Some(token) => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => Err(Error::new(ErrorKind::Cancelled)),
                        result = self.execute_once(url, request, auth_headers) => result,
                    }
                }
                None => self.execute_once(url, request, auth_headers).await,
            };

            let err = match result.and_then(Response::check_evolution_error) {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };

            if !policy.is_eligible(&err) {
                return Err(err.with_attempts(attempts));
            }

            let Some(delay) = policy.next_delay(err.retry_after()) else {
                return Err(err.with_attempts(attempts));
            };

            warn!(
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Request failed, retrying"
            );

            if let Err(cancelled) = self.sleep(delay, request).await {
                return Err(cancelled.with_attempts(attempts));
            }
        }
    }

    async fn sleep(&self, delay: Duration, request: &RequestBuilder) -> Result<()> {
        match &request.cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(Error::new(ErrorKind::Cancelled)),
                _ = tokio::time::sleep(delay) => Ok(()),
            },
            None => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }

    /// Execute a single attempt without retry logic.
    async fn execute_once(
        &self,
        url: &Url,
        request: &RequestBuilder,
        auth_headers: &[(&'static str, String)],
    ) -> Result<Response> {
        let mut req = self
            .inner
            .request(request.method.to_reqwest(), url.clone());

        for (name, value) in &self.config.extra_headers {
            req = req.header(name.as_str(), value.as_str());
        }
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        for (name, value) in auth_headers {
            req = req.header(*name, value.as_str());
        }

        if !request.query_params.is_empty() {
            req = req.query(&request.query_params);
        }

        // Multipart forms are single-use, so they are rebuilt for each attempt.
        if let Some(ref body) = request.body {
            req = match body {
                RequestBody::Json(value) => req.json(value),
                RequestBody::Multipart(parts) => req.multipart(MultipartPart::to_form(parts)?),
            };
        }

        if self.config.debug {
            debug!(
                method = ?request.method,
                url = %url,
                instance = request.instance.as_deref().unwrap_or("-"),
                "Sending request"
            );
        }

        let response = Response::read(req.send().await?).await?;

        if self.config.debug {
            let status = response.status();
            let content_length = response.bytes().len();

            if response.is_success() {
                debug!(status, content_length, "Response received");
            } else {
                info!(status, content_length, "Non-success response");
            }
        }

        Ok(response)
    }
}

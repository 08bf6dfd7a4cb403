//! Client configuration.

use crate::error::{Error, ErrorKind, Result};
use crate::retry::RetryConfig;
use std::collections::HashMap;
use std::time::Duration;

/// Environment variable holding the server base URL.
pub const ENV_BASE_URL: &str = "EVOLUTION_BASE_URL";
/// Environment variable holding the global API key.
pub const ENV_API_KEY: &str = "EVOLUTION_API_KEY";
/// Environment variable holding the default instance name.
pub const ENV_INSTANCE_NAME: &str = "EVOLUTION_INSTANCE_NAME";
/// Environment variable holding the request timeout, in seconds.
pub const ENV_TIMEOUT: &str = "EVOLUTION_TIMEOUT";
/// Environment variable holding the maximum number of retries.
pub const ENV_MAX_RETRIES: &str = "EVOLUTION_MAX_RETRIES";
/// Environment variable toggling verbose request logging.
pub const ENV_DEBUG: &str = "EVOLUTION_DEBUG";

/// Configuration for an Evolution API client.
///
/// The recognized options are the fields below. Anything server-specific
/// that is not modelled here goes through `extra_headers`.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the Evolution API server.
    pub base_url: String,
    /// Global API key, sent when no instance token applies.
    pub api_key: Option<String>,
    /// Per-instance tokens, keyed by instance name.
    pub instance_tokens: HashMap<String, String>,
    /// Instance used when a call does not name one.
    pub default_instance: Option<String>,
    /// Retry configuration.
    pub retry: RetryConfig,
    /// Per-attempt request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Pool idle timeout.
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per host.
    pub pool_max_idle_per_host: usize,
    /// Accept gzip/deflate compressed responses.
    pub accept_compressed: bool,
    /// User-Agent header value.
    pub user_agent: String,
    /// Log every request and response line.
    pub debug: bool,
    /// Additional headers sent with every request.
    pub extra_headers: Vec<(String, String)>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field(
                "instance_tokens",
                &self.instance_tokens.keys().collect::<Vec<_>>(),
            )
            .field("default_instance", &self.default_instance)
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    /// Create a config for the given base URL with default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            instance_tokens: HashMap::new(),
            default_instance: None,
            retry: RetryConfig::default(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            accept_compressed: true,
            user_agent: crate::USER_AGENT.to_string(),
            debug: false,
            extra_headers: Vec::new(),
        }
    }

    /// Create a new client config builder.
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::new(base_url),
        }
    }

    /// Load configuration from the process environment.
    ///
    /// Recognized variables:
    /// - `EVOLUTION_BASE_URL` (required)
    /// - `EVOLUTION_API_KEY`
    /// - `EVOLUTION_INSTANCE_NAME`
    /// - `EVOLUTION_TIMEOUT` (seconds, default 30)
    /// - `EVOLUTION_MAX_RETRIES` (default 3)
    /// - `EVOLUTION_DEBUG` (`true`/`1`/`yes`/`on`, default off)
    ///
    /// Any other variable is ignored.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let base_url = get(ENV_BASE_URL).ok_or_else(|| {
            Error::new(ErrorKind::Config(format!(
                "environment variable {ENV_BASE_URL} is not set"
            )))
        })?;

        let mut config = Self::new(base_url);
        config.api_key = get(ENV_API_KEY);
        config.default_instance = get(ENV_INSTANCE_NAME);

        if let Some(raw) = get(ENV_TIMEOUT) {
            let secs: f64 = raw.trim().parse().map_err(|_| {
                Error::new(ErrorKind::Config(format!(
                    "{ENV_TIMEOUT} must be a number of seconds, got {raw:?}"
                )))
            })?;
            if !secs.is_finite() || secs <= 0.0 {
                return Err(Error::new(ErrorKind::Config(format!(
                    "{ENV_TIMEOUT} must be positive, got {raw:?}"
                ))));
            }
            config.timeout = Duration::try_from_secs_f64(secs).map_err(|_| {
                Error::new(ErrorKind::Config(format!(
                    "{ENV_TIMEOUT} is too large, got {raw:?}"
                )))
            })?;
        }

        if let Some(raw) = get(ENV_MAX_RETRIES) {
            config.retry.max_retries = raw.trim().parse().map_err(|_| {
                Error::new(ErrorKind::Config(format!(
                    "{ENV_MAX_RETRIES} must be a non-negative integer, got {raw:?}"
                )))
            })?;
        }

        if let Some(raw) = get(ENV_DEBUG) {
            config.debug = matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        Ok(config)
    }
}

/// Builder for ClientConfig.
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the global API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = Some(api_key.into());
        self
    }

    /// Register a token for a specific instance.
    pub fn with_instance_token(
        mut self,
        instance: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        self.config
            .instance_tokens
            .insert(instance.into(), token.into());
        self
    }

    /// Set the instance used when calls do not name one.
    pub fn with_default_instance(mut self, instance: impl Into<String>) -> Self {
        self.config.default_instance = Some(instance.into());
        self
    }

    /// Set the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set the maximum number of retries, keeping the rest of the retry config.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.config.retry.max_retries = retries;
        self
    }

    /// Disable retries.
    pub fn without_retry(mut self) -> Self {
        self.config.retry = RetryConfig::no_retry();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set pool idle timeout.
    pub fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    /// Set maximum idle connections per host.
    pub fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.config.pool_max_idle_per_host = max;
        self
    }

    /// Accept compressed responses.
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.config.accept_compressed = enabled;
        self
    }

    /// Set custom User-Agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Enable or disable verbose request/response logging.
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.config.debug = enabled;
        self
    }

    /// Add a header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.extra_headers.push((name.into(), value.into()));
        self
    }

    /// Build the client configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

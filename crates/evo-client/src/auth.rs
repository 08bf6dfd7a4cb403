//! Authentication header construction.
//!
//! The Evolution API authenticates every call with an `apikey` header. A
//! server has one global key; instances created on it may also carry their
//! own token, which is accepted for calls scoped to that instance.
//!
//! Precedence for a single request:
//! 1. an explicit per-call key,
//! 2. the token registered for the target instance,
//! 3. the global key.

use std::collections::HashMap;

use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};

/// Name of the header carrying the credential.
pub const API_KEY_HEADER: &str = "apikey";

/// Builds auth headers for outgoing requests.
///
/// The handler is immutable after construction and is shared read-only by
/// concurrent requests.
#[derive(Clone, Default)]
pub struct AuthHandler {
    global_key: Option<String>,
    instance_tokens: HashMap<String, String>,
}

impl std::fmt::Debug for AuthHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthHandler")
            .field("global_key", &self.global_key.as_ref().map(|_| "[REDACTED]"))
            .field(
                "instance_tokens",
                &self.instance_tokens.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl AuthHandler {
    /// Create a handler with an optional global key and no instance tokens.
    pub fn new(global_key: Option<String>) -> Self {
        Self {
            global_key: global_key.filter(|k| !k.is_empty()),
            instance_tokens: HashMap::new(),
        }
    }

    /// Create a handler from the auth fields of a client config.
    pub fn from_config(config: &ClientConfig) -> Self {
        let mut handler = Self::new(config.api_key.clone());
        for (instance, token) in &config.instance_tokens {
            handler = handler.with_instance_token(instance.clone(), token.clone());
        }
        handler
    }

    /// Register a token for an instance.
    pub fn with_instance_token(
        mut self,
        instance: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        let token = token.into();
        if !token.is_empty() {
            self.instance_tokens.insert(instance.into(), token);
        }
        self
    }

    /// Returns true if a global key is configured.
    pub fn has_global_key(&self) -> bool {
        self.global_key.is_some()
    }

    /// Returns true if a token is registered for the instance.
    pub fn has_instance_token(&self, instance: &str) -> bool {
        self.instance_tokens.contains_key(instance)
    }

    /// Resolve the credential for a request, without building headers.
    pub fn credential_for<'a>(
        &'a self,
        instance: Option<&str>,
        override_key: Option<&'a str>,
    ) -> Option<&'a str> {
        override_key
            .filter(|k| !k.is_empty())
            .or_else(|| instance.and_then(|name| self.instance_tokens.get(name).map(String::as_str)))
            .or(self.global_key.as_deref())
    }

    /// Produce the auth headers for a request.
    ///
    /// Returns an empty set when no credential applies and `required` is
    /// false, and an `AuthenticationConfig` error when it is true.
    pub fn headers_for(
        &self,
        instance: Option<&str>,
        override_key: Option<&str>,
        required: bool,
    ) -> Result<Vec<(&'static str, String)>> {
        match self.credential_for(instance, override_key) {
            Some(key) => Ok(vec![(API_KEY_HEADER, key.to_string())]),
            None if required => {
                let target = instance
                    .map(|name| format!("instance {name:?}"))
                    .unwrap_or_else(|| "account-level call".to_string());
                Err(Error::new(ErrorKind::AuthenticationConfig(format!(
                    "no API key or instance token configured for {target}"
                ))))
            }
            None => Ok(Vec::new()),
        }
    }
}

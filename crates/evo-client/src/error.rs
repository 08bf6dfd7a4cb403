//! Error types for evolution-sdk-client.

use std::fmt;
use std::time::Duration;

/// Result type alias for Evolution API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Evolution API operations.
///
/// Every failure surfaces as one of the closed set of [`ErrorKind`]s. The
/// optional [`ApiFamily`] narrows the error to the resource family that
/// produced it without changing the kind or its metadata.
#[derive(Debug, thiserror::Error)]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Resource family the failing call belonged to, if any.
    pub family: Option<ApiFamily>,
    /// Number of HTTP attempts performed before giving up (0 if none were made).
    pub attempts: u32,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.family {
            Some(family) => write!(f, "{family} error: {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            family: None,
            attempts: 0,
            source: None,
        }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            family: None,
            attempts: 0,
            source: Some(Box::new(source)),
        }
    }

    /// Build a caller-side validation error from a list of violations.
    pub fn invalid_request(violations: Vec<Violation>) -> Self {
        Self::new(ErrorKind::Validation {
            origin: ValidationOrigin::Request,
            violations,
        })
    }

    /// Build a response-schema validation error from a list of violations.
    pub fn invalid_response(violations: Vec<Violation>) -> Self {
        Self::new(ErrorKind::Validation {
            origin: ValidationOrigin::Response,
            violations,
        })
    }

    /// Tag the error with a resource family. An existing tag is kept.
    pub fn in_family(mut self, family: ApiFamily) -> Self {
        self.family.get_or_insert(family);
        self
    }

    /// Record how many attempts were made.
    pub(crate) fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Returns true if this is a rate limit error.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self.kind, ErrorKind::RateLimited { .. })
    }

    /// Returns true if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Authentication(_) | ErrorKind::AuthenticationConfig(_)
        )
    }

    /// Returns true if the target resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::NotFound(_))
    }

    /// Returns true if this is a validation error of any origin.
    pub fn is_validation(&self) -> bool {
        matches!(self.kind, ErrorKind::Validation { .. })
    }

    /// Returns the retry-after duration if this is a rate limit error.
    pub fn retry_after(&self) -> Option<Duration> {
        match &self.kind {
            ErrorKind::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Returns the HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        self.kind.status()
    }

    /// Returns the field-level violations of a validation error.
    pub fn violations(&self) -> &[Violation] {
        match &self.kind {
            ErrorKind::Validation { violations, .. } => violations,
            _ => &[],
        }
    }

    /// Returns true if the error came from a message call.
    pub fn is_message_error(&self) -> bool {
        self.family == Some(ApiFamily::Message)
    }

    /// Returns true if the error came from a media upload or download.
    pub fn is_media_error(&self) -> bool {
        self.family == Some(ApiFamily::Media)
    }

    /// Returns true if the error came from an instance call.
    pub fn is_instance_error(&self) -> bool {
        self.family == Some(ApiFamily::Instance)
    }

    /// Returns true if the error came from a group call.
    pub fn is_group_error(&self) -> bool {
        self.family == Some(ApiFamily::Group)
    }

    /// Returns true if the error came from a webhook or event integration call.
    pub fn is_webhook_error(&self) -> bool {
        self.family == Some(ApiFamily::Webhook)
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Credentials rejected by the server (HTTP 401).
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// No credential is configured for a request that needs one.
    #[error("Authentication configuration error: {0}")]
    AuthenticationConfig(String),

    /// Credentials accepted but not allowed (HTTP 403).
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// Resource not found (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Parameters or payloads that did not conform.
    #[error("Validation error ({origin}): {}", summarize(violations))]
    Validation {
        origin: ValidationOrigin,
        violations: Vec<Violation>,
    },

    /// Rate limit exceeded (HTTP 429).
    #[error("Rate limited{}", retry_after.map(|d| format!(", retry after {:?}", d)).unwrap_or_default())]
    RateLimited { retry_after: Option<Duration> },

    /// Request timeout.
    #[error("Request timeout")]
    Timeout,

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The call was cancelled by the caller.
    #[error("Request cancelled")]
    Cancelled,

    /// Server error (HTTP 5xx).
    #[error("Server error: {status} {message}")]
    Server { status: u16, message: String },

    /// Any other unsuccessful HTTP status.
    #[error("HTTP error: {status} {message}")]
    Http { status: u16, message: String },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl ErrorKind {
    /// Returns true if this error kind is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            ErrorKind::RateLimited { .. } => true,
            ErrorKind::Timeout => true,
            ErrorKind::Connection(_) => true,
            ErrorKind::Server { .. } => true,
            ErrorKind::Http { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    /// Returns the HTTP status this kind maps to, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ErrorKind::Authentication(_) => Some(401),
            ErrorKind::Authorization(_) => Some(403),
            ErrorKind::NotFound(_) => Some(404),
            ErrorKind::RateLimited { .. } => Some(429),
            ErrorKind::Validation {
                origin: ValidationOrigin::Server { status },
                ..
            } => Some(*status),
            ErrorKind::Server { status, .. } | ErrorKind::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Check if an HTTP status code is typically retryable.
pub(crate) fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

fn summarize(violations: &[Violation]) -> String {
    if violations.is_empty() {
        return "no details".to_string();
    }
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Where a validation failure was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOrigin {
    /// Caller-supplied parameters, rejected before any network call.
    Request,
    /// The server rejected the request (HTTP 400 or 422).
    Server { status: u16 },
    /// The server response did not match the expected model.
    Response,
}

impl fmt::Display for ValidationOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationOrigin::Request => f.write_str("request"),
            ValidationOrigin::Server { status } => write!(f, "server {status}"),
            ValidationOrigin::Response => f.write_str("response"),
        }
    }
}

/// A single field that did not conform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path of the offending field (empty when the whole value is at fault).
    pub field: String,
    /// What was wrong with it.
    pub message: String,
}

impl Violation {
    /// Create a new violation.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

/// Resource family an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiFamily {
    Instance,
    Message,
    Media,
    Chat,
    Group,
    Profile,
    Webhook,
}

impl fmt::Display for ApiFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApiFamily::Instance => "Instance",
            ApiFamily::Message => "Message",
            ApiFamily::Media => "Media",
            ApiFamily::Chat => "Chat",
            ApiFamily::Group => "Group",
            ApiFamily::Profile => "Profile",
            ApiFamily::Webhook => "Webhook",
        };
        f.write_str(name)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_connect() {
            ErrorKind::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            ErrorKind::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_request() {
            // Transport failures that occur after connect (reset, TLS, DNS).
            ErrorKind::Connection(err.to_string())
        } else if err.is_decode() {
            ErrorKind::Json(err.to_string())
        } else {
            ErrorKind::Other(err.to_string())
        };

        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::InvalidUrl(err.to_string()), err)
    }
}

//! HTTP response handling with Evolution-specific error mapping.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::{Error, ErrorKind, Result, ValidationOrigin, Violation};
use crate::security::redact::sanitize_error_message;

/// A fully read HTTP response.
///
/// The body is buffered so the response can be inspected for error
/// envelopes before it is handed to model parsing.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// Read a reqwest response to completion.
    pub(crate) async fn read(inner: reqwest::Response) -> Result<Self> {
        let status = inner.status().as_u16();
        let headers = inner.headers().clone();
        let body = inner.bytes().await?;
        Ok(Self {
            status,
            headers,
            body,
        })
    }

    /// Build a response from its parts.
    pub fn from_parts(status: u16, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns true if the response status is successful (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Get the Retry-After header as a Duration.
    pub fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after").and_then(parse_retry_after)
    }

    /// The raw body.
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Get the response body as text.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec()).map_err(|e| {
            Error::with_source(
                ErrorKind::Other("Failed to decode response as UTF-8".to_string()),
                e,
            )
        })
    }

    /// Deserialize the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(Into::into)
    }

    /// The body as a JSON value. An empty body yields `Value::Null`.
    pub fn into_value(self) -> Result<Value> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        self.json()
    }

    /// Convert a non-2xx response into the matching error.
    pub fn check_evolution_error(self) -> Result<Response> {
        if self.is_success() {
            return Ok(self);
        }

        let retry_after = self.retry_after();
        let body = String::from_utf8_lossy(&self.body);
        Err(parse_error_response(self.status, &body, retry_after))
    }
}

/// Parse a Retry-After value given either as delta-seconds or an HTTP date.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let at = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    let wait = at.with_timezone(&chrono::Utc) - chrono::Utc::now();
    Some(wait.to_std().unwrap_or(Duration::ZERO))
}

/// The error envelope Evolution wraps failures in:
/// `{"status": 400, "error": "Bad Request", "response": {"message": [...]}}`.
#[derive(Debug, Default, serde::Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    response: Option<EnvelopeBody>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct EnvelopeBody {
    #[serde(default)]
    message: Option<Value>,
}

impl ErrorEnvelope {
    fn messages(&self) -> Option<&Value> {
        self.response
            .as_ref()
            .and_then(|r| r.message.as_ref())
            .or(self.message.as_ref())
    }

    fn error_text(&self) -> Option<String> {
        match self.error.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(sanitize_error_message(s)),
            Value::Null => None,
            other => Some(sanitize_error_message(&other.to_string())),
        }
    }
}

/// Map an unsuccessful status and its body to an error kind.
pub(crate) fn parse_error_response(status: u16, body: &str, retry_after: Option<Duration>) -> Error {
    if status == 429 {
        return Error::new(ErrorKind::RateLimited { retry_after });
    }

    let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap_or_default();
    let violations = envelope
        .messages()
        .map(extract_violations)
        .unwrap_or_default();

    let message = if violations.is_empty() {
        envelope
            .error_text()
            .unwrap_or_else(|| sanitize_error_message(body.trim()))
    } else {
        violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    };
    let message = if message.is_empty() {
        default_reason(status).to_string()
    } else {
        message
    };

    let kind = match status {
        400 | 422 => ErrorKind::Validation {
            origin: ValidationOrigin::Server { status },
            violations: if violations.is_empty() {
                vec![Violation::new("", message)]
            } else {
                violations
            },
        },
        401 => ErrorKind::Authentication(message),
        403 => ErrorKind::Authorization(message),
        404 => ErrorKind::NotFound(message),
        500..=599 => ErrorKind::Server { status, message },
        _ => ErrorKind::Http { status, message },
    };

    Error::new(kind)
}

fn default_reason(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("unexpected status")
}

fn field_pattern() -> &'static regex_lite::Regex {
    static PATTERN: OnceLock<regex_lite::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex_lite::Regex::new(
            r#"property\s+"?([A-Za-z_][\w.\[\]]*)"?|^"?([A-Za-z_][\w.\[\]]*)"?\s+(?:is|must|should)\s"#,
        )
        .expect("static regex compiles")
    })
}

/// Flatten an envelope `message` (string, array, nested arrays, or
/// objects) into violations, extracting field names where the text names one.
pub(crate) fn extract_violations(messages: &Value) -> Vec<Violation> {
    let mut out = Vec::new();
    collect_violations(messages, &mut out);
    out
}

fn collect_violations(value: &Value, out: &mut Vec<Violation>) {
    match value {
        Value::String(text) => {
            let text = sanitize_error_message(text.trim());
            if text.is_empty() {
                return;
            }
            let field = field_pattern()
                .captures(&text)
                .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            out.push(Violation::new(field, text));
        }
        Value::Array(items) => items.iter().for_each(|item| collect_violations(item, out)),
        // Unknown recipients come back as `{"exists": false, "number": "...", "jid": "..."}`.
        Value::Object(map) if map.get("exists") == Some(&Value::Bool(false)) => {
            let number = map
                .get("number")
                .or_else(|| map.get("jid"))
                .and_then(Value::as_str)
                .unwrap_or("recipient");
            out.push(Violation::new(
                "number",
                format!("{number} does not exist on WhatsApp"),
            ));
        }
        Value::Object(map) => {
            if let Some(inner) = map.get("message") {
                collect_violations(inner, out);
            } else {
                out.push(Violation::new("", sanitize_error_message(&value.to_string())));
            }
        }
        Value::Null => {}
        other => out.push(Violation::new("", other.to_string())),
    }
}

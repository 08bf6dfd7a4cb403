//! Acknowledgement returned by action endpoints.

use serde_json::{Map, Value};

use crate::fields::{FieldReader, FromResponse};

/// Generic `{"status": .., "error": .., "response": {"message": ..}}` reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ack {
    pub status: Option<String>,
    pub error: Option<bool>,
    /// Text of an `error` field given as a string, e.g. `"Bad Request"`.
    pub error_text: Option<String>,
    pub message: Option<String>,
    pub extra: Map<String, Value>,
}

impl FromResponse for Ack {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        let message = fields
            .raw(&["message"])
            .and_then(message_text)
            .or_else(|| {
                fields
                    .raw(&["response"])
                    .and_then(|r| r.get("message"))
                    .and_then(message_text)
            });

        let (error, error_text) = match fields.raw(&["error"]) {
            None => (None, None),
            Some(Value::Bool(b)) => (Some(*b), None),
            Some(Value::Number(n)) => (Some(n.as_u64() != Some(0)), None),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => (Some(true), None),
                "false" | "" => (Some(false), None),
                _ => (Some(true), Some(s.clone())),
            },
            Some(other) => (Some(true), Some(other.to_string())),
        };

        Self {
            status: fields.string(&["status"]),
            error,
            error_text,
            message,
            extra: fields.extra(),
        }
    }

    fn empty() -> Option<Self> {
        Some(Self::default())
    }
}

impl Ack {
    /// Returns false only when the server flagged an error.
    pub fn is_ok(&self) -> bool {
        self.error != Some(true)
    }
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    }
}

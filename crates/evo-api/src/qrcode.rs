//! QR code payloads returned while linking a device.

use base64::Engine;
use evolution_sdk_client::{Error, ErrorKind, Result, Violation};
use serde_json::{Map, Value};

use crate::fields::{type_name, FieldReader, FromResponse};

/// A QR payload in any of the shapes the server sends.
///
/// Older servers return the image as a bare string; newer ones return an
/// object with the image, the raw pairing code, and a counter.
#[derive(Debug, Clone, PartialEq)]
pub enum QrPayload {
    /// A bare string, taken to be the base64 image.
    Text(String),
    /// The structured form.
    Structured(QrCode),
}

/// Structured QR code data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QrCode {
    /// How many codes were generated for this session so far.
    pub count: Option<i64>,
    /// The image, usually a `data:image/png;base64,` URL.
    pub base64: Option<String>,
    /// The raw code encoded in the image.
    pub code: Option<String>,
    /// Pairing code for linking by phone number.
    pub pairing_code: Option<String>,
    /// Any other fields.
    pub extra: Map<String, Value>,
}

impl FromResponse for QrCode {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        Self {
            count: fields.int(&["count"]),
            base64: fields.string(&["base64"]),
            code: fields.string(&["code"]),
            pairing_code: fields.string(&["pairingCode", "pairing_code"]),
            extra: fields.extra(),
        }
    }
}

impl QrCode {
    /// Returns true if the object carries any QR data at all.
    pub fn is_empty(&self) -> bool {
        self.base64.is_none() && self.code.is_none() && self.pairing_code.is_none()
    }
}

impl QrPayload {
    /// Read a payload by sniffing its shape.
    ///
    /// Returns `Ok(None)` for null and empty strings, and the violations
    /// found at `path` otherwise.
    pub fn from_value(value: &Value, path: &str) -> std::result::Result<Option<Self>, Vec<Violation>> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => Ok(Some(QrPayload::Text(s.clone()))),
            Value::Object(map) => {
                let mut reader = FieldReader::new(map, path);
                let code = QrCode::read(&mut reader);
                match reader.finish() {
                    Ok(()) => Ok(Some(QrPayload::Structured(code))),
                    Err(err) => Err(err.violations().to_vec()),
                }
            }
            other => Err(vec![Violation::new(
                path,
                format!("expected string or object, got {}", type_name(other)),
            )]),
        }
    }

    /// The image as base64 text, for every shape.
    pub fn base64(&self) -> Option<&str> {
        match self {
            QrPayload::Text(s) => Some(s.as_str()),
            QrPayload::Structured(code) => code.base64.as_deref(),
        }
    }

    /// The raw code, when the server sent one.
    pub fn code(&self) -> Option<&str> {
        match self {
            QrPayload::Text(_) => None,
            QrPayload::Structured(code) => code.code.as_deref(),
        }
    }

    /// The pairing code, when the server sent one.
    pub fn pairing_code(&self) -> Option<&str> {
        match self {
            QrPayload::Text(_) => None,
            QrPayload::Structured(code) => code.pairing_code.as_deref(),
        }
    }

    /// The generation counter, when the server sent one.
    pub fn count(&self) -> Option<i64> {
        match self {
            QrPayload::Text(_) => None,
            QrPayload::Structured(code) => code.count,
        }
    }

    /// Decode the image into bytes, stripping a `data:<mime>;base64,` prefix.
    pub fn decode_image(&self) -> Result<Vec<u8>> {
        let encoded = self.base64().ok_or_else(|| {
            Error::new(ErrorKind::Other("QR payload has no image".to_string()))
        })?;
        decode_base64_image(encoded)
    }
}

/// Decode base64 image data, with or without a data-URL prefix.
pub fn decode_base64_image(encoded: &str) -> Result<Vec<u8>> {
    let data = match encoded.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };
    let data: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(data.as_bytes())
        .map_err(|e| {
            Error::with_source(ErrorKind::Other(format!("invalid base64 image: {e}")), e)
        })
}

/// Read an optional QR payload field from a reader.
pub(crate) fn read_qr(fields: &mut FieldReader<'_>, keys: &[&str]) -> Option<QrPayload> {
    let key = keys
        .iter()
        .copied()
        .find(|k| fields.has(&[*k]))
        .unwrap_or_else(|| keys.first().copied().unwrap_or_default());
    let path = fields.path_of(key);
    let value = fields.raw(keys)?;
    match QrPayload::from_value(value, &path) {
        Ok(payload) => payload,
        Err(violations) => {
            fields.extend_violations(violations);
            None
        }
    }
}

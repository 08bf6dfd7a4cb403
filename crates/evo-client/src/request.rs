//! HTTP request building for Evolution API calls.

use bytes::Bytes;
use serde::Serialize;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, ErrorKind, Result, Violation};
use crate::security::url as url_security;

/// Placeholder replaced by the (encoded) instance name in request paths.
pub const INSTANCE_PLACEHOLDER: &str = "{instance}";

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl RequestMethod {
    /// Convert to reqwest::Method.
    pub fn to_reqwest(&self) -> reqwest::Method {
        match self {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Patch => reqwest::Method::PATCH,
            RequestMethod::Put => reqwest::Method::PUT,
            RequestMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Builder for a single logical API call.
///
/// The builder is owned data only, so it can be replayed for every retry
/// attempt.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    pub(crate) method: RequestMethod,
    pub(crate) path: String,
    pub(crate) instance: Option<String>,
    pub(crate) headers: HashMap<String, String>,
    pub(crate) query_params: Vec<(String, String)>,
    pub(crate) body: Option<RequestBody>,
    pub(crate) api_key: Option<String>,
    pub(crate) requires_auth: bool,
    pub(crate) retry: bool,
    pub(crate) cancel: Option<CancellationToken>,
}

/// Request body content.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(serde_json::Value),
    Multipart(Vec<MultipartPart>),
}

/// One part of a multipart upload.
#[derive(Clone)]
pub enum MultipartPart {
    /// Plain form field.
    Text { name: String, value: String },
    /// Binary file field.
    File {
        name: String,
        file_name: String,
        mime: String,
        data: Bytes,
    },
}

impl std::fmt::Debug for MultipartPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MultipartPart::Text { name, value } => f
                .debug_struct("Text")
                .field("name", name)
                .field("value", value)
                .finish(),
            MultipartPart::File {
                name,
                file_name,
                mime,
                data,
            } => f
                .debug_struct("File")
                .field("name", name)
                .field("file_name", file_name)
                .field("mime", mime)
                .field("len", &data.len())
                .finish(),
        }
    }
}

impl MultipartPart {
    /// Create a text field.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        MultipartPart::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Create a file field. The mime type is guessed from the file name.
    pub fn file(name: impl Into<String>, file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let mime = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        MultipartPart::File {
            name: name.into(),
            file_name,
            mime,
            data: data.into(),
        }
    }

    /// Turn the parts into a fresh reqwest form.
    pub(crate) fn to_form(parts: &[MultipartPart]) -> Result<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for part in parts {
            form = match part {
                MultipartPart::Text { name, value } => form.text(name.clone(), value.clone()),
                MultipartPart::File {
                    name,
                    file_name,
                    mime,
                    data,
                } => {
                    let file = reqwest::multipart::Part::bytes(data.to_vec())
                        .file_name(file_name.clone())
                        .mime_str(mime)
                        .map_err(|e| {
                            Error::with_source(
                                ErrorKind::Other(format!("invalid mime type {mime:?}")),
                                e,
                            )
                        })?;
                    form.part(name.clone(), file)
                }
            };
        }
        Ok(form)
    }
}

impl RequestBuilder {
    /// Create a new request builder for a path relative to the base URL.
    pub fn new(method: RequestMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            instance: None,
            headers: HashMap::new(),
            query_params: Vec::new(),
            body: None,
            api_key: None,
            requires_auth: true,
            retry: true,
            cancel: None,
        }
    }

    /// Create a GET request builder.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(RequestMethod::Get, path)
    }

    /// Create a POST request builder.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(RequestMethod::Post, path)
    }

    /// Create a PUT request builder.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(RequestMethod::Put, path)
    }

    /// Create a PATCH request builder.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(RequestMethod::Patch, path)
    }

    /// Create a DELETE request builder.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(RequestMethod::Delete, path)
    }

    /// Target an instance. Fills the `{instance}` placeholder and selects
    /// the instance token, if one is registered.
    pub fn instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Target an instance if one is given.
    pub fn maybe_instance(mut self, instance: Option<&str>) -> Self {
        if let Some(name) = instance {
            self.instance = Some(name.to_string());
        }
        self
    }

    /// Use this key for the call instead of the configured ones.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Send the call even when no credential is configured.
    pub fn optional_auth(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    /// Make a single attempt regardless of the retry config.
    pub fn no_retry(mut self) -> Self {
        self.retry = false;
        self
    }

    /// Abort the call when the token is cancelled.
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((name.into(), value.into()));
        self
    }

    /// Add a query parameter if the value is present.
    pub fn query_opt(self, name: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(name, value.to_string()),
            None => self,
        }
    }

    /// Add every field of a serializable struct as query parameters.
    pub fn query_params<T: Serialize>(mut self, params: &T) -> Result<Self> {
        let encoded = serde_urlencoded::to_string(params).map_err(|e| {
            Error::with_source(ErrorKind::Json(format!("cannot encode query: {e}")), e)
        })?;
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(&encoded).map_err(|e| {
            Error::with_source(ErrorKind::Json(format!("cannot encode query: {e}")), e)
        })?;
        self.query_params.extend(pairs);
        Ok(self)
    }

    /// Set JSON body.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body)?;
        self.body = Some(RequestBody::Json(value));
        Ok(self)
    }

    /// Set raw JSON body.
    pub fn json_value(mut self, body: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Set a multipart body.
    pub fn multipart(mut self, parts: Vec<MultipartPart>) -> Self {
        self.body = Some(RequestBody::Multipart(parts));
        self
    }

    /// The raw path template.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The request method.
    pub fn method(&self) -> RequestMethod {
        self.method
    }

    /// The instance this call targets, if any.
    pub fn target_instance(&self) -> Option<&str> {
        self.instance.as_deref()
    }

    /// Fill in the default instance when none was given.
    pub(crate) fn with_default_instance(mut self, default: Option<&str>) -> Self {
        if self.instance.is_none() {
            self.instance = default.map(str::to_string);
        }
        self
    }

    /// Resolve the path template into a concrete path.
    pub(crate) fn resolved_path(&self) -> Result<String> {
        if !self.path.contains(INSTANCE_PLACEHOLDER) {
            return Ok(self.path.clone());
        }

        match self.instance.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(self
                .path
                .replace(INSTANCE_PLACEHOLDER, &url_security::encode_param(name))),
            _ => Err(Error::invalid_request(vec![Violation::new(
                "instance",
                "an instance name is required and no default instance is configured",
            )])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = RequestBuilder::get("/instance/fetchInstances")
            .header("X-Custom", "value")
            .query("instanceName", "demo")
            .api_key("call-key");

        assert_eq!(req.method, RequestMethod::Get);
        assert_eq!(req.path, "/instance/fetchInstances");
        assert_eq!(req.headers.get("X-Custom"), Some(&"value".to_string()));
        assert_eq!(req.query_params.len(), 1);
        assert_eq!(req.api_key.as_deref(), Some("call-key"));
        assert!(req.requires_auth);
        assert!(req.retry);
    }

    #[test]
    fn test_instance_placeholder() {
        let req = RequestBuilder::post("/message/sendText/{instance}").instance("my bot");
        assert_eq!(req.resolved_path().unwrap(), "/message/sendText/my%20bot");
    }

    #[test]
    fn test_default_instance_fallback() {
        let req = RequestBuilder::get("/instance/connectionState/{instance}")
            .with_default_instance(Some("fallback"));
        assert_eq!(
            req.resolved_path().unwrap(),
            "/instance/connectionState/fallback"
        );

        let req = RequestBuilder::get("/instance/connectionState/{instance}")
            .instance("explicit")
            .with_default_instance(Some("fallback"));
        assert_eq!(req.target_instance(), Some("explicit"));
    }

    #[test]
    fn test_missing_instance_is_validation_error() {
        let req = RequestBuilder::get("/instance/connect/{instance}");
        let err = req.resolved_path().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.violations()[0].field, "instance");

        let req = RequestBuilder::get("/instance/connect/{instance}").instance("   ");
        assert!(req.resolved_path().is_err());
    }

    #[test]
    fn test_query_params_from_struct() {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Params {
            group_jid: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            get_participants: Option<bool>,
        }

        let req = RequestBuilder::get("/group/findGroupInfos/{instance}")
            .query_params(&Params {
                group_jid: "123@g.us",
                get_participants: Some(true),
            })
            .unwrap();
        assert_eq!(
            req.query_params,
            vec![
                ("groupJid".to_string(), "123@g.us".to_string()),
                ("getParticipants".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_opt() {
        let req = RequestBuilder::get("/x")
            .query_opt("a", Some(1))
            .query_opt("b", None::<u8>);
        assert_eq!(req.query_params, vec![("a".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_json_body() {
        let data = serde_json::json!({"number": "5511999999999", "text": "hi"});
        let req = RequestBuilder::post("/message/sendText/{instance}")
            .json(&data)
            .unwrap();

        assert!(matches!(req.body, Some(RequestBody::Json(_))));
    }

    #[test]
    fn test_multipart_guesses_mime() {
        let part = MultipartPart::file("file", "photo.png", vec![1u8, 2, 3]);
        match &part {
            MultipartPart::File { mime, data, .. } => {
                assert_eq!(mime, "image/png");
                assert_eq!(data.len(), 3);
            }
            other => panic!("unexpected part {other:?}"),
        }
        assert!(MultipartPart::to_form(&[part, MultipartPart::text("number", "55")]).is_ok());
    }
}

//! Instance models: lifecycle, connection state, and settings.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::fields::{FieldReader, FromResponse};
use crate::qrcode::{read_qr, QrCode, QrPayload};
use crate::webhook::WebhookConfig;

/// Integration used by new instances unless told otherwise.
pub const DEFAULT_INTEGRATION: &str = "WHATSAPP-BAILEYS";

const NAME_KEYS: &[&str] = &["instanceName", "instance_name", "name"];
const STATUS_KEYS: &[&str] = &["status", "connectionStatus", "connection_status"];

open_enum! {
    /// Lifecycle status of an instance as reported by the server.
    pub enum InstanceStatus {
        Created => "created",
        Connecting => "connecting",
        Open => "open",
        Close => "close",
        Connected => "connected",
        Disconnected => "disconnected",
        Deleted => "deleted",
    }
}

impl InstanceStatus {
    /// Returns true if the session is linked and usable.
    pub fn is_connected(&self) -> bool {
        matches!(self, InstanceStatus::Open | InstanceStatus::Connected)
    }
}

open_enum! {
    /// WhatsApp connection state of an instance.
    pub enum ConnectionState {
        Open => "open",
        Close => "close",
        Connecting => "connecting",
    }
}

/// A WhatsApp session managed by the server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instance {
    pub instance_name: String,
    pub instance_id: Option<String>,
    pub status: Option<InstanceStatus>,
    pub state: Option<ConnectionState>,
    /// JID of the linked account.
    pub owner: Option<String>,
    pub profile_name: Option<String>,
    pub profile_picture_url: Option<String>,
    pub integration: Option<String>,
    pub number: Option<String>,
    pub token: Option<String>,
    pub client_name: Option<String>,
    pub business_id: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub qrcode: Option<QrPayload>,
    pub extra: Map<String, Value>,
}

impl FromResponse for Instance {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        // `fetchInstances` on older servers wraps every entry as {"instance": {...}}.
        if !fields.has(NAME_KEYS) && fields.object().get("instance").is_some_and(Value::is_object) {
            return fields.nested(&["instance"]).unwrap_or_default();
        }

        Self {
            instance_name: fields.required_string(NAME_KEYS),
            instance_id: fields.string(&["instanceId", "instance_id", "id"]),
            status: fields.enumeration(STATUS_KEYS),
            state: fields.enumeration(&["state"]),
            owner: fields.string(&["owner", "ownerJid", "owner_jid"]),
            profile_name: fields.string(&["profileName", "profile_name"]),
            profile_picture_url: fields.string(&[
                "profilePictureUrl",
                "profilePicUrl",
                "profile_picture_url",
            ]),
            integration: fields.string(&["integration"]),
            number: fields.string(&["number"]),
            token: fields.string(&["token", "apikey"]),
            client_name: fields.string(&["clientName", "client_name"]),
            business_id: fields.string(&["businessId", "business_id"]),
            created_at: fields.string(&["createdAt", "created_at"]),
            updated_at: fields.string(&["updatedAt", "updated_at"]),
            qrcode: read_qr(fields, &["qrcode"]),
            extra: fields.extra(),
        }
    }
}

impl Instance {
    /// Returns true if the session is linked, by status or by state.
    pub fn is_connected(&self) -> bool {
        self.status.as_ref().is_some_and(InstanceStatus::is_connected)
            || self.state == Some(ConnectionState::Open)
    }

    /// The QR image carried on the instance, if any.
    pub fn qr_base64(&self) -> Option<&str> {
        self.qrcode.as_ref().and_then(QrPayload::base64)
    }
}

/// Response of create/connect and other instance calls.
///
/// Accepts the wrapped shape `{"instance": {...}, "hash": ..., "qrcode": ...}`,
/// a flat instance object, and the bare QR object `connect` returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceResponse {
    /// Envelope status text such as `"success"`, when the instance is wrapped.
    pub status: Option<String>,
    pub instance: Option<Instance>,
    pub instances: Vec<Instance>,
    /// Token the server issued for the instance.
    pub hash: Option<String>,
    pub qrcode: Option<QrPayload>,
    pub settings: Option<InstanceSettings>,
    pub extra: Map<String, Value>,
}

impl FromResponse for InstanceResponse {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        let wrapped = fields.object().get("instance").is_some_and(Value::is_object);
        let flat = !wrapped && fields.has(NAME_KEYS);

        let (status, instance) = if wrapped {
            (fields.string(&["status"]), fields.nested(&["instance"]))
        } else if flat {
            (None, Some(fields.flatten::<Instance>()))
        } else {
            (fields.string(&["status"]), None)
        };

        let hash = match fields.raw(&["hash"]) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Object(map)) => map.get("apikey").and_then(Value::as_str).map(str::to_string),
            Some(_) => {
                fields.violate("hash", "expected string or object");
                None
            }
            None => None,
        };

        // A flat instance already carries its own qrcode.
        let mut qrcode = if flat { None } else { read_qr(fields, &["qrcode", "qr"]) };
        if qrcode.is_none() && !flat && fields.has(&["base64", "code", "pairingCode"]) {
            let code = fields.flatten::<QrCode>();
            qrcode = Some(QrPayload::Structured(code));
        }

        Self {
            status,
            instance,
            instances: fields.list(&["instances"]),
            hash,
            qrcode,
            settings: fields.nested(&["settings"]),
            extra: fields.extra(),
        }
    }
}

impl InstanceResponse {
    /// Name of the instance in the response.
    pub fn instance_name(&self) -> Option<&str> {
        self.instance.as_ref().map(|i| i.instance_name.as_str())
    }

    /// Status of the instance in the response.
    pub fn instance_status(&self) -> Option<&InstanceStatus> {
        self.instance.as_ref().and_then(|i| i.status.as_ref())
    }

    /// The QR payload, whether at the top level or on the instance.
    pub fn qr(&self) -> Option<&QrPayload> {
        self.qrcode
            .as_ref()
            .or_else(|| self.instance.as_ref().and_then(|i| i.qrcode.as_ref()))
    }

    /// The QR image as base64 text.
    pub fn qr_base64(&self) -> Option<&str> {
        self.qr().and_then(QrPayload::base64)
    }

    /// The per-instance token, from `hash` or the instance itself.
    pub fn token(&self) -> Option<&str> {
        self.hash
            .as_deref()
            .or_else(|| self.instance.as_ref().and_then(|i| i.token.as_deref()))
    }
}

/// Point-in-time connection state of one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionStateResponse {
    pub instance_name: Option<String>,
    pub state: ConnectionState,
    pub extra: Map<String, Value>,
}

impl Default for ConnectionStateResponse {
    fn default() -> Self {
        Self {
            instance_name: None,
            state: ConnectionState::Close,
            extra: Map::new(),
        }
    }
}

impl FromResponse for ConnectionStateResponse {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        if fields.object().get("instance").is_some_and(Value::is_object) {
            return fields.nested(&["instance"]).unwrap_or_default();
        }

        Self {
            instance_name: fields.string(NAME_KEYS),
            state: ConnectionState::parse(&fields.required_string(&["state", "connectionStatus"])),
            extra: fields.extra(),
        }
    }
}

impl ConnectionStateResponse {
    /// Returns true if the instance is connected.
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }
}

/// Options for creating an instance.
///
/// QR generation defaults to on and the integration to
/// [`DEFAULT_INTEGRATION`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstance {
    pub(crate) instance_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qrcode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reject_call: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg_call: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups_ignore: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub always_online: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_messages: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_status: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_full_history: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<WebhookConfig>,
    /// Server-specific fields sent as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CreateInstance {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a caller-chosen instance token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Pair by phone number instead of QR.
    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    /// Do not generate a QR code on creation.
    pub fn without_qrcode(mut self) -> Self {
        self.qrcode = Some(false);
        self
    }

    /// Set the integration type.
    pub fn with_integration(mut self, integration: impl Into<String>) -> Self {
        self.integration = Some(integration.into());
        self
    }

    /// Configure instance settings at creation time.
    pub fn with_settings(mut self, settings: &InstanceSettings) -> Self {
        self.reject_call = settings.reject_call;
        self.msg_call = settings.msg_call.clone();
        self.groups_ignore = settings.groups_ignore;
        self.always_online = settings.always_online;
        self.read_messages = settings.read_messages;
        self.read_status = settings.read_status;
        self.sync_full_history = settings.sync_full_history;
        self
    }

    /// Register a webhook at creation time.
    pub fn with_webhook(mut self, webhook: WebhookConfig) -> Self {
        self.webhook = Some(webhook);
        self
    }

    /// Send an extra field as-is.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub(crate) fn prepared(mut self, name: &str) -> Self {
        self.instance_name = name.to_string();
        self.qrcode.get_or_insert(true);
        self.integration
            .get_or_insert_with(|| DEFAULT_INTEGRATION.to_string());
        self
    }
}

/// Filter for listing instances.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchInstancesFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

impl FetchInstancesFilter {
    /// Only the named instance.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            instance_name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Only the instance with this id.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            instance_id: Some(id.into()),
            ..Default::default()
        }
    }
}

/// Behaviour settings of an instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reject_call: Option<bool>,
    /// Message sent to rejected callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg_call: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups_ignore: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub always_online: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_messages: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_status: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_full_history: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FromResponse for InstanceSettings {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        if fields.object().get("settings").is_some_and(Value::is_object) {
            return fields.nested(&["settings"]).unwrap_or_default();
        }

        Self {
            reject_call: fields.bool(&["rejectCall", "reject_call"]),
            msg_call: fields.string(&["msgCall", "msg_call"]),
            groups_ignore: fields.bool(&["groupsIgnore", "groups_ignore"]),
            always_online: fields.bool(&["alwaysOnline", "always_online"]),
            read_messages: fields.bool(&["readMessages", "read_messages"]),
            read_status: fields.bool(&["readStatus", "read_status"]),
            sync_full_history: fields.bool(&["syncFullHistory", "sync_full_history"]),
            extra: fields.extra(),
        }
    }
}

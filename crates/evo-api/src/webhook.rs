//! Event delivery configuration: webhook, websocket, RabbitMQ and SQS.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::fields::{FieldReader, FromResponse};

open_enum! {
    /// An event the server can deliver.
    pub enum WebhookEvent {
        ApplicationStartup => "APPLICATION_STARTUP",
        QrcodeUpdated => "QRCODE_UPDATED",
        ConnectionUpdate => "CONNECTION_UPDATE",
        MessagesSet => "MESSAGES_SET",
        MessagesUpsert => "MESSAGES_UPSERT",
        MessagesEdited => "MESSAGES_EDITED",
        MessagesUpdate => "MESSAGES_UPDATE",
        MessagesDelete => "MESSAGES_DELETE",
        SendMessage => "SEND_MESSAGE",
        ContactsSet => "CONTACTS_SET",
        ContactsUpsert => "CONTACTS_UPSERT",
        ContactsUpdate => "CONTACTS_UPDATE",
        PresenceUpdate => "PRESENCE_UPDATE",
        ChatsSet => "CHATS_SET",
        ChatsUpsert => "CHATS_UPSERT",
        ChatsUpdate => "CHATS_UPDATE",
        ChatsDelete => "CHATS_DELETE",
        GroupsUpsert => "GROUPS_UPSERT",
        GroupUpdate => "GROUP_UPDATE",
        GroupParticipantsUpdate => "GROUP_PARTICIPANTS_UPDATE",
        LabelsEdit => "LABELS_EDIT",
        LabelsAssociation => "LABELS_ASSOCIATION",
        Call => "CALL",
        TypebotStart => "TYPEBOT_START",
        TypebotChangeStatus => "TYPEBOT_CHANGE_STATUS",
    }
}

fn read_events(fields: &mut FieldReader<'_>) -> Vec<WebhookEvent> {
    fields
        .strings(&["events"])
        .into_iter()
        .map(WebhookEvent::from)
        .collect()
}

/// HTTP webhook registration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    pub enabled: bool,
    pub url: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    /// Post each event to `<url>/<event-name>`.
    pub by_events: bool,
    /// Inline media as base64 in event payloads.
    pub base64: bool,
    pub events: Vec<WebhookEvent>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WebhookConfig {
    /// An enabled webhook for the given events.
    pub fn new(url: impl Into<String>, events: Vec<WebhookEvent>) -> Self {
        Self {
            enabled: true,
            url: url.into(),
            events,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn by_events(mut self, enabled: bool) -> Self {
        self.by_events = enabled;
        self
    }

    pub fn with_base64(mut self, enabled: bool) -> Self {
        self.base64 = enabled;
        self
    }

    /// Disable delivery, keeping the rest of the registration.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

impl FromResponse for WebhookConfig {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        if fields.object().get("webhook").is_some_and(Value::is_object) {
            return fields.nested(&["webhook"]).unwrap_or_default();
        }

        Self {
            enabled: fields.bool(&["enabled"]).unwrap_or(false),
            url: fields.string(&["url"]).unwrap_or_default(),
            headers: fields.string_map(&["headers"]),
            by_events: fields
                .bool(&["byEvents", "webhookByEvents", "webhook_by_events"])
                .unwrap_or(false),
            base64: fields
                .bool(&["base64", "webhookBase64", "webhook_base64"])
                .unwrap_or(false),
            events: read_events(fields),
            extra: fields.extra(),
        }
    }
}

/// Event stream configuration shared by websocket, RabbitMQ and SQS.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventStreamConfig {
    pub enabled: bool,
    pub events: Vec<WebhookEvent>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub type WebsocketConfig = EventStreamConfig;
pub type RabbitmqConfig = EventStreamConfig;
pub type SqsConfig = EventStreamConfig;

impl EventStreamConfig {
    /// An enabled stream for the given events.
    pub fn new(events: Vec<WebhookEvent>) -> Self {
        Self {
            enabled: true,
            events,
            extra: Map::new(),
        }
    }

    /// A disabled stream.
    pub fn off() -> Self {
        Self::default()
    }

    /// Read the config under `wrapper` (such as `"websocket"`) or at the top level.
    pub(crate) fn read_wrapped(fields: &mut FieldReader<'_>, wrapper: &str) -> Self {
        if fields.object().get(wrapper).is_some_and(Value::is_object) {
            return fields.nested(&[wrapper]).unwrap_or_default();
        }
        Self::read(fields)
    }
}

impl FromResponse for EventStreamConfig {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        Self {
            enabled: fields.bool(&["enabled"]).unwrap_or(false),
            events: read_events(fields),
            extra: fields.extra(),
        }
    }
}

/// Newtypes that read the config from the endpoint's wrapper key.
macro_rules! wrapped_stream {
    ($name:ident, $key:literal) => {
        pub(crate) struct $name(pub(crate) EventStreamConfig);

        impl FromResponse for $name {
            fn read(fields: &mut FieldReader<'_>) -> Self {
                Self(EventStreamConfig::read_wrapped(fields, $key))
            }
        }

        impl From<$name> for EventStreamConfig {
            fn from(wrapped: $name) -> Self {
                wrapped.0
            }
        }
    };
}

wrapped_stream!(WrappedWebsocket, "websocket");
wrapped_stream!(WrappedRabbitmq, "rabbitmq");
wrapped_stream!(WrappedSqs, "sqs");

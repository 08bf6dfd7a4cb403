//! Chat, contact, and message history models.

use std::fmt;

use evolution_sdk_client::{Error, Result, Violation};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::fields::{FieldReader, FromResponse};
use crate::message::{MessageKey, MessageStatus};
use crate::qrcode::decode_base64_image;

/// Presence shown to a chat or to everyone.
///
/// Unlike server-sent values this is a closed set: the server rejects
/// anything else, so the client does too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Available,
    Unavailable,
    Composing,
    Recording,
    Paused,
}

impl Presence {
    pub const ALL: [Presence; 5] = [
        Presence::Available,
        Presence::Unavailable,
        Presence::Composing,
        Presence::Recording,
        Presence::Paused,
    ];

    /// Parse a presence name, failing with a request validation error.
    pub fn parse(raw: &str) -> Result<Self> {
        let wanted = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| {
                Error::invalid_request(vec![Violation::new(
                    "presence",
                    format!(
                        "must be one of available, unavailable, composing, recording, paused; got {raw:?}"
                    ),
                )])
            })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Presence::Available => "available",
            Presence::Unavailable => "unavailable",
            Presence::Composing => "composing",
            Presence::Recording => "recording",
            Presence::Paused => "paused",
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Presence {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Presence::parse(s)
    }
}

/// Result of checking whether a number has WhatsApp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhatsAppNumber {
    pub exists: bool,
    pub jid: Option<String>,
    pub number: Option<String>,
    pub name: Option<String>,
    pub extra: Map<String, Value>,
}

impl FromResponse for WhatsAppNumber {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        Self {
            exists: fields.bool(&["exists"]).unwrap_or(false),
            jid: fields.string(&["jid"]),
            number: fields.string(&["number"]),
            name: fields.string(&["name"]),
            extra: fields.extra(),
        }
    }
}

/// A conversation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chat {
    pub id: Option<String>,
    pub remote_jid: Option<String>,
    pub name: Option<String>,
    pub profile_picture_url: Option<String>,
    pub unread_count: Option<i64>,
    pub archived: Option<bool>,
    pub updated_at: Option<String>,
    pub extra: Map<String, Value>,
}

impl FromResponse for Chat {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        Self {
            id: fields.string(&["id"]),
            remote_jid: fields.string(&["remoteJid", "remote_jid"]),
            name: fields.string(&["name", "pushName", "push_name"]),
            profile_picture_url: fields.string(&["profilePicUrl", "profilePictureUrl"]),
            unread_count: fields.int(&["unreadCount", "unreadMessages", "unread_count"]),
            archived: fields.bool(&["archived"]),
            updated_at: fields.string(&["updatedAt", "updated_at"]),
            extra: fields.extra(),
        }
    }
}

impl Chat {
    /// Returns true for group chats.
    pub fn is_group(&self) -> bool {
        self.remote_jid
            .as_deref()
            .or(self.id.as_deref())
            .is_some_and(|jid| jid.ends_with(evolution_sdk_client::security::jid::GROUP_SUFFIX))
    }
}

/// A saved or seen contact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contact {
    pub id: Option<String>,
    pub remote_jid: Option<String>,
    pub push_name: Option<String>,
    pub profile_picture_url: Option<String>,
    pub extra: Map<String, Value>,
}

impl FromResponse for Contact {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        Self {
            id: fields.string(&["id"]),
            remote_jid: fields.string(&["remoteJid", "remote_jid"]),
            push_name: fields.string(&["pushName", "push_name", "name"]),
            profile_picture_url: fields.string(&["profilePicUrl", "profilePictureUrl"]),
            extra: fields.extra(),
        }
    }
}

/// A stored message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageRecord {
    pub id: Option<String>,
    pub key: Option<MessageKey>,
    pub push_name: Option<String>,
    pub message_type: Option<String>,
    pub message: Option<Value>,
    pub message_timestamp: Option<i64>,
    pub status: Option<MessageStatus>,
    pub extra: Map<String, Value>,
}

impl FromResponse for MessageRecord {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        Self {
            id: fields.string(&["id"]),
            key: fields.nested(&["key"]),
            push_name: fields.string(&["pushName", "push_name"]),
            message_type: fields.string(&["messageType", "message_type"]),
            message: fields.raw(&["message"]).cloned(),
            message_timestamp: fields.int(&["messageTimestamp", "message_timestamp"]),
            status: fields.enumeration(&["status"]),
            extra: fields.extra(),
        }
    }
}

impl MessageRecord {
    /// Plain text of the message, for text and extended text messages.
    pub fn text(&self) -> Option<&str> {
        let message = self.message.as_ref()?;
        message
            .get("conversation")
            .or_else(|| message.get("extendedTextMessage").and_then(|m| m.get("text")))
            .and_then(Value::as_str)
    }
}

/// One page of message history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePage {
    pub total: Option<i64>,
    pub pages: Option<i64>,
    pub current_page: Option<i64>,
    pub records: Vec<MessageRecord>,
}

impl FromResponse for MessagePage {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        if fields.object().get("messages").is_some_and(Value::is_object) {
            return fields.nested(&["messages"]).unwrap_or_default();
        }

        Self {
            total: fields.int(&["total"]),
            pages: fields.int(&["pages"]),
            current_page: fields.int(&["currentPage", "current_page"]),
            records: fields.list(&["records", "messages"]),
        }
    }
}

/// A contact's profile picture.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilePictureUrl {
    pub wuid: Option<String>,
    pub profile_picture_url: Option<String>,
}

impl FromResponse for ProfilePictureUrl {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        Self {
            wuid: fields.string(&["wuid", "jid"]),
            profile_picture_url: fields.string(&["profilePictureUrl", "profilePicUrl"]),
        }
    }
}

/// Media of a stored message, as base64.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaData {
    pub media_type: Option<String>,
    pub file_name: Option<String>,
    pub caption: Option<String>,
    pub mimetype: Option<String>,
    pub base64: String,
    pub extra: Map<String, Value>,
}

impl FromResponse for MediaData {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        Self {
            media_type: fields.string(&["mediaType", "media_type"]),
            file_name: fields.string(&["fileName", "file_name"]),
            caption: fields.string(&["caption"]),
            mimetype: fields.string(&["mimetype", "mimeType"]),
            base64: fields.required_string(&["base64"]),
            extra: fields.extra(),
        }
    }
}

impl MediaData {
    /// Decode the media into bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        decode_base64_image(&self.base64)
    }
}

/// Filter for message history.
#[derive(Debug, Clone, Default)]
pub struct MessageQuery {
    pub remote_jid: Option<String>,
    pub id: Option<String>,
    pub from_me: Option<bool>,
    pub page: Option<u32>,
    pub offset: Option<u32>,
}

impl MessageQuery {
    /// Messages of one chat.
    pub fn chat(remote_jid: impl Into<String>) -> Self {
        Self {
            remote_jid: Some(remote_jid.into()),
            ..Default::default()
        }
    }

    pub fn with_page(mut self, page: u32, offset: u32) -> Self {
        self.page = Some(page);
        self.offset = Some(offset);
        self
    }

    /// `{"where": {"key": {...}}, "page": .., "offset": ..}`
    pub(crate) fn to_body(&self) -> Value {
        let mut key = Map::new();
        if let Some(jid) = &self.remote_jid {
            key.insert("remoteJid".into(), json!(jid));
        }
        if let Some(id) = &self.id {
            key.insert("id".into(), json!(id));
        }
        if let Some(from_me) = self.from_me {
            key.insert("fromMe".into(), json!(from_me));
        }

        let mut body = Map::new();
        let filter = if key.is_empty() { json!({}) } else { json!({ "key": key }) };
        body.insert("where".into(), filter);
        if let Some(page) = self.page {
            body.insert("page".into(), json!(page));
        }
        if let Some(offset) = self.offset {
            body.insert("offset".into(), json!(offset));
        }
        Value::Object(body)
    }
}

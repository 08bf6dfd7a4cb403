//! Message send payloads and the send result model.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::fields::{FieldReader, FromResponse};

open_enum! {
    /// Delivery status of a message.
    pub enum MessageStatus {
        Pending => "PENDING",
        ServerAck => "SERVER_ACK",
        DeliveryAck => "DELIVERY_ACK",
        Read => "READ",
        Played => "PLAYED",
        Error => "ERROR",
        Deleted => "DELETED",
        Success => "success",
    }
}

open_enum! {
    /// Kind of media attached to a message.
    pub enum MediaType {
        Image => "image",
        Video => "video",
        Audio => "audio",
        Document => "document",
    }
}

impl MediaType {
    /// Guess the media type from a mime type.
    pub fn from_mime(mime: &str) -> Self {
        match mime.split('/').next().unwrap_or_default() {
            "image" => MediaType::Image,
            "video" => MediaType::Video,
            "audio" => MediaType::Audio,
            _ => MediaType::Document,
        }
    }
}

/// Identifies one message in a chat.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_jid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_me: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,
}

impl MessageKey {
    /// Key of a message in a chat.
    pub fn new(remote_jid: impl Into<String>, id: impl Into<String>, from_me: bool) -> Self {
        Self {
            remote_jid: Some(remote_jid.into()),
            from_me: Some(from_me),
            id: Some(id.into()),
            participant: None,
        }
    }
}

impl FromResponse for MessageKey {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        Self {
            remote_jid: fields.string(&["remoteJid", "remote_jid"]),
            from_me: fields.bool(&["fromMe", "from_me"]),
            id: fields.string(&["id"]),
            participant: fields.string(&["participant"]),
        }
    }
}

/// Result of a send call.
///
/// A send succeeded when the server assigned the message an id; the HTTP
/// status alone says nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageResponse {
    pub key: Option<MessageKey>,
    pub status: Option<MessageStatus>,
    /// The message body as the server echoed it.
    pub message: Option<Value>,
    pub message_type: Option<String>,
    /// Unix seconds.
    pub message_timestamp: Option<i64>,
    pub push_name: Option<String>,
    pub instance_id: Option<String>,
    pub extra: Map<String, Value>,
}

impl FromResponse for MessageResponse {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        Self {
            key: fields.nested(&["key"]),
            status: fields.enumeration(&["status"]),
            message: fields.raw(&["message"]).cloned(),
            message_type: fields.string(&["messageType", "message_type"]),
            message_timestamp: fields.int(&["messageTimestamp", "message_timestamp"]),
            push_name: fields.string(&["pushName", "push_name"]),
            instance_id: fields.string(&["instanceId", "instance_id"]),
            extra: fields.extra(),
        }
    }
}

impl MessageResponse {
    /// The id the server assigned, if any.
    pub fn message_id(&self) -> Option<&str> {
        self.key
            .as_ref()
            .and_then(|k| k.id.as_deref())
            .filter(|id| !id.is_empty())
    }

    /// Returns true if the message was accepted.
    pub fn is_success(&self) -> bool {
        self.message_id().is_some()
    }

    /// JID the message was sent to.
    pub fn remote_jid(&self) -> Option<&str> {
        self.key.as_ref().and_then(|k| k.remote_jid.as_deref())
    }
}

/// A message being replied to.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Quoted {
    pub key: MessageKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
}

impl Quoted {
    /// Quote a message by id.
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            key: MessageKey {
                id: Some(id.into()),
                ..Default::default()
            },
            message: None,
        }
    }

    /// Include the quoted text so it renders without a lookup.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.message = Some(serde_json::json!({ "conversation": text.into() }));
        self
    }
}

/// Options shared by every send call.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOptions {
    /// Milliseconds to show "typing" before sending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quoted: Option<Quoted>,
    #[serde(rename = "mentionsEveryOne", skip_serializing_if = "Option::is_none")]
    pub mentions_everyone: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mentioned: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_preview: Option<bool>,
}

impl SendOptions {
    pub fn with_delay(mut self, millis: u32) -> Self {
        self.delay = Some(millis);
        self
    }

    pub fn with_quoted(mut self, quoted: Quoted) -> Self {
        self.quoted = Some(quoted);
        self
    }

    pub fn mention_everyone(mut self) -> Self {
        self.mentions_everyone = Some(true);
        self
    }

    pub fn mention(mut self, number: impl Into<String>) -> Self {
        self.mentioned.push(number.into());
        self
    }

    pub fn with_link_preview(mut self, enabled: bool) -> Self {
        self.link_preview = Some(enabled);
        self
    }
}

/// Adds the shared option setters to a payload with `options` and `extra`.
macro_rules! send_payload {
    ($name:ident) => {
        impl $name {
            /// Set the shared send options.
            pub fn with_options(mut self, options: SendOptions) -> Self {
                self.options = options;
                self
            }

            /// Show "typing" for this many milliseconds first.
            pub fn with_delay(mut self, millis: u32) -> Self {
                self.options.delay = Some(millis);
                self
            }

            /// Reply to a message.
            pub fn quoting(mut self, quoted: Quoted) -> Self {
                self.options.quoted = Some(quoted);
                self
            }

            /// Send an extra field as-is.
            pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
                self.extra.insert(key.into(), value.into());
                self
            }
        }
    };
}

/// A text message.
#[derive(Debug, Clone, Serialize)]
pub struct SendText {
    pub number: String,
    pub text: String,
    #[serde(flatten)]
    pub options: SendOptions,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SendText {
    pub fn new(number: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            text: text.into(),
            options: SendOptions::default(),
            extra: Map::new(),
        }
    }
}

send_payload!(SendText);

/// A media message referencing a URL or base64 data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMedia {
    pub number: String,
    pub mediatype: MediaType,
    /// A URL or base64 data.
    pub media: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(flatten)]
    pub options: SendOptions,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SendMedia {
    pub fn new(number: impl Into<String>, mediatype: MediaType, media: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            mediatype,
            media: media.into(),
            mimetype: None,
            caption: None,
            file_name: None,
            options: SendOptions::default(),
            extra: Map::new(),
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_mimetype(mut self, mimetype: impl Into<String>) -> Self {
        self.mimetype = Some(mimetype.into());
        self
    }
}

send_payload!(SendMedia);

/// A media file uploaded as multipart form data.
#[derive(Debug, Clone)]
pub struct SendMediaFile {
    pub number: String,
    pub file_name: String,
    pub data: bytes::Bytes,
    /// Guessed from the file name when not set.
    pub mediatype: Option<MediaType>,
    pub caption: Option<String>,
    pub delay: Option<u32>,
}

impl SendMediaFile {
    pub fn new(
        number: impl Into<String>,
        file_name: impl Into<String>,
        data: impl Into<bytes::Bytes>,
    ) -> Self {
        Self {
            number: number.into(),
            file_name: file_name.into(),
            data: data.into(),
            mediatype: None,
            caption: None,
            delay: None,
        }
    }

    pub fn with_mediatype(mut self, mediatype: MediaType) -> Self {
        self.mediatype = Some(mediatype);
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_delay(mut self, millis: u32) -> Self {
        self.delay = Some(millis);
        self
    }
}

/// A voice note.
#[derive(Debug, Clone, Serialize)]
pub struct SendAudio {
    pub number: String,
    /// A URL or base64 data.
    pub audio: String,
    /// Convert to WhatsApp's voice format on the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<bool>,
    #[serde(flatten)]
    pub options: SendOptions,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SendAudio {
    pub fn new(number: impl Into<String>, audio: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            audio: audio.into(),
            encoding: None,
            options: SendOptions::default(),
            extra: Map::new(),
        }
    }
}

send_payload!(SendAudio);

/// A sticker.
#[derive(Debug, Clone, Serialize)]
pub struct SendSticker {
    pub number: String,
    /// A URL or base64 data.
    pub sticker: String,
    #[serde(flatten)]
    pub options: SendOptions,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SendSticker {
    pub fn new(number: impl Into<String>, sticker: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            sticker: sticker.into(),
            options: SendOptions::default(),
            extra: Map::new(),
        }
    }
}

send_payload!(SendSticker);

/// A location pin.
#[derive(Debug, Clone, Serialize)]
pub struct SendLocation {
    pub number: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(flatten)]
    pub options: SendOptions,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SendLocation {
    pub fn new(
        number: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            number: number.into(),
            name: name.into(),
            address: address.into(),
            latitude,
            longitude,
            options: SendOptions::default(),
            extra: Map::new(),
        }
    }
}

send_payload!(SendLocation);

/// A contact card.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactCard {
    pub full_name: String,
    /// WhatsApp id (digits only).
    pub wuid: String,
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ContactCard {
    pub fn new(full_name: impl Into<String>, wuid: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            wuid: wuid.into(),
            phone_number: phone_number.into(),
            ..Default::default()
        }
    }
}

/// One or more contact cards.
#[derive(Debug, Clone, Serialize)]
pub struct SendContact {
    pub number: String,
    #[serde(rename = "contact")]
    pub contacts: Vec<ContactCard>,
    #[serde(flatten)]
    pub options: SendOptions,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SendContact {
    pub fn new(number: impl Into<String>, contacts: Vec<ContactCard>) -> Self {
        Self {
            number: number.into(),
            contacts,
            options: SendOptions::default(),
            extra: Map::new(),
        }
    }
}

send_payload!(SendContact);

/// An emoji reaction to a message. An empty reaction removes it.
#[derive(Debug, Clone, Serialize)]
pub struct SendReaction {
    pub key: MessageKey,
    pub reaction: String,
}

impl SendReaction {
    pub fn new(key: MessageKey, reaction: impl Into<String>) -> Self {
        Self {
            key,
            reaction: reaction.into(),
        }
    }
}

/// A poll.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPoll {
    pub number: String,
    pub name: String,
    pub selectable_count: u32,
    pub values: Vec<String>,
    #[serde(flatten)]
    pub options: SendOptions,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SendPoll {
    pub fn new(number: impl Into<String>, name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            number: number.into(),
            name: name.into(),
            selectable_count: 1,
            values,
            options: SendOptions::default(),
            extra: Map::new(),
        }
    }

    pub fn with_selectable_count(mut self, count: u32) -> Self {
        self.selectable_count = count;
        self
    }
}

send_payload!(SendPoll);

open_enum! {
    /// Content kind of a status post.
    pub enum StatusType {
        Text => "text",
        Image => "image",
        Video => "video",
        Audio => "audio",
    }
}

/// A status (story) post.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendStatus {
    #[serde(rename = "type")]
    pub kind: StatusType,
    /// Text, or a URL for media.
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<u8>,
    pub all_contacts: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub status_jid_list: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SendStatus {
    /// A text status shown to all contacts.
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(StatusType::Text, content)
    }

    pub fn new(kind: StatusType, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            caption: None,
            background_color: None,
            font: None,
            all_contacts: true,
            status_jid_list: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Show the status only to these JIDs.
    pub fn only_to(mut self, jids: Vec<String>) -> Self {
        self.all_contacts = false;
        self.status_jid_list = jids;
        self
    }

    pub fn with_background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }
}

use serde_json::{json, Value};
use tracing::instrument;

use evolution_sdk_client::{ApiFamily, RequestBuilder, Result};

use super::{target, EvolutionClient};
use crate::ack::Ack;
use crate::chat::{
    Chat, Contact, MediaData, MessagePage, MessageQuery, Presence, ProfilePictureUrl,
    WhatsAppNumber,
};
use crate::message::{MessageKey, MessageResponse};
use crate::validate::Validator;

const FAMILY: ApiFamily = ApiFamily::Chat;

/// Chats, contacts and message history.
#[derive(Debug, Clone, Copy)]
pub struct ChatApi<'a> {
    client: &'a EvolutionClient,
}

impl<'a> ChatApi<'a> {
    pub(crate) fn new(client: &'a EvolutionClient) -> Self {
        Self { client }
    }

    /// Check which numbers have WhatsApp.
    #[instrument(skip(self, numbers), fields(count = numbers.len()))]
    pub async fn check_whatsapp_numbers(&self, instance: &str, numbers: &[String]) -> Result<Vec<WhatsAppNumber>> {
        let mut check = self.check(instance);
        check.recipients("numbers", numbers);
        let request = self.request(instance, "whatsappNumbers", check, json!({ "numbers": numbers }))?;
        self.client.fetch_list(request, FAMILY).await
    }

    /// Mark messages as read.
    #[instrument(skip(self, keys), fields(count = keys.len()))]
    pub async fn mark_as_read(&self, instance: &str, keys: &[MessageKey]) -> Result<Ack> {
        let mut check = self.check(instance);
        check.not_empty_list("readMessages", keys);
        let request = self.request(instance, "markMessageAsRead", check, json!({ "readMessages": keys }))?;
        self.client.fetch(request, FAMILY).await
    }

    /// Mark a chat as unread, given its last message.
    #[instrument(skip(self, last_message))]
    pub async fn mark_as_unread(&self, instance: &str, chat: &str, last_message: &MessageKey) -> Result<Ack> {
        let mut check = self.check(instance);
        check.recipient("chat", chat);
        let body = json!({ "chat": chat, "lastMessage": { "key": last_message } });
        let request = self.request(instance, "markChatUnread", check, body)?;
        self.client.fetch(request, FAMILY).await
    }

    /// Archive or unarchive a chat.
    #[instrument(skip(self, last_message))]
    pub async fn archive_chat(
        &self,
        instance: &str,
        chat: &str,
        last_message: &MessageKey,
        archive: bool,
    ) -> Result<Ack> {
        let mut check = self.check(instance);
        check.recipient("chat", chat);
        let body = json!({ "chat": chat, "archive": archive, "lastMessage": { "key": last_message } });
        let request = self.request(instance, "archiveChat", check, body)?;
        self.client.fetch(request, FAMILY).await
    }

    /// Delete a message for every participant.
    #[instrument(skip(self, key))]
    pub async fn delete_message_for_everyone(&self, instance: &str, key: &MessageKey) -> Result<Ack> {
        let mut check = self.check(instance);
        check
            .not_empty("id", key.id.as_deref().unwrap_or_default())
            .not_empty("remoteJid", key.remote_jid.as_deref().unwrap_or_default());
        check.finish().map_err(|e| e.in_family(FAMILY))?;

        let request = RequestBuilder::delete("/chat/deleteMessageForEveryone/{instance}")
            .maybe_instance(target(instance))
            .json(key)?;
        self.client.fetch(request, FAMILY).await
    }

    /// Edit the text of a sent message.
    #[instrument(skip(self, key, text))]
    pub async fn update_message(
        &self,
        instance: &str,
        number: &str,
        key: &MessageKey,
        text: &str,
    ) -> Result<MessageResponse> {
        let mut check = self.check(instance);
        check
            .recipient("number", number)
            .not_empty("key.id", key.id.as_deref().unwrap_or_default())
            .not_empty("text", text);
        let body = json!({ "number": number, "key": key, "text": text });
        let request = self.request(instance, "updateMessage", check, body)?;
        self.client.fetch(request, FAMILY).await
    }

    /// Show a presence (such as "composing") in one chat for `delay_ms`.
    #[instrument(skip(self))]
    pub async fn send_presence(
        &self,
        instance: &str,
        number: &str,
        presence: Presence,
        delay_ms: u32,
    ) -> Result<Ack> {
        let mut check = self.check(instance);
        check.recipient("number", number);
        let body = json!({ "number": number, "presence": presence, "delay": delay_ms });
        let request = self.request(instance, "sendPresence", check, body)?;
        self.client.fetch(request, FAMILY).await
    }

    #[instrument(skip(self))]
    pub async fn fetch_profile_picture_url(&self, instance: &str, number: &str) -> Result<ProfilePictureUrl> {
        let mut check = self.check(instance);
        check.recipient("number", number);
        let request = self.request(instance, "fetchProfilePictureUrl", check, json!({ "number": number }))?;
        self.client.fetch(request, FAMILY).await
    }

    /// Download the media of a stored message as base64.
    #[instrument(skip(self))]
    pub async fn get_base64_from_media_message(
        &self,
        instance: &str,
        message_id: &str,
        convert_to_mp4: bool,
    ) -> Result<MediaData> {
        let mut check = self.check(instance);
        check.not_empty("message.key.id", message_id);
        let body = json!({
            "message": { "key": { "id": message_id } },
            "convertToMp4": convert_to_mp4,
        });
        let request = self.request(instance, "getBase64FromMediaMessage", check, body)?;
        self.client.fetch(request, ApiFamily::Media).await
    }

    /// List contacts, optionally only the one with `id`.
    #[instrument(skip(self))]
    pub async fn find_contacts(&self, instance: &str, id: Option<&str>) -> Result<Vec<Contact>> {
        let filter = match id {
            Some(id) => json!({ "where": { "id": id } }),
            None => json!({ "where": {} }),
        };
        let request = self.request(instance, "findContacts", self.check(instance), filter)?;
        self.client.fetch_list(request, FAMILY).await
    }

    /// Page through stored messages.
    #[instrument(skip(self))]
    pub async fn find_messages(&self, instance: &str, query: &MessageQuery) -> Result<MessagePage> {
        let request = self.request(instance, "findMessages", self.check(instance), query.to_body())?;
        let value = self.client.send(request, FAMILY).await?;
        read_page(&value).map_err(|e| e.in_family(FAMILY))
    }

    /// Page through status updates.
    #[instrument(skip(self))]
    pub async fn find_status_messages(&self, instance: &str, query: &MessageQuery) -> Result<MessagePage> {
        let mut body = query.to_body();
        // Status filters match on the top-level remoteJid and id, not on a key.
        if let Some(key) = body.get_mut("where").and_then(|w| w.get_mut("key")).map(Value::take) {
            body["where"] = key;
        }
        let request = self.request(instance, "findStatusMessage", self.check(instance), body)?;
        let value = self.client.send(request, FAMILY).await?;
        read_page(&value).map_err(|e| e.in_family(FAMILY))
    }

    #[instrument(skip(self))]
    pub async fn find_chats(&self, instance: &str) -> Result<Vec<Chat>> {
        let request = self.request(instance, "findChats", self.check(instance), json!({}))?;
        self.client.fetch_list(request, FAMILY).await
    }

    fn check(&self, instance: &str) -> Validator {
        let mut check = Validator::new();
        check.instance(target(instance));
        check
    }

    fn request(&self, instance: &str, endpoint: &str, mut check: Validator, body: Value) -> Result<RequestBuilder> {
        check.finish().map_err(|e| e.in_family(FAMILY))?;
        Ok(RequestBuilder::post(format!("/chat/{endpoint}/{{instance}}"))
            .maybe_instance(target(instance))
            .json_value(body))
    }
}

/// Older servers return a bare array of records instead of a page.
fn read_page(value: &Value) -> Result<MessagePage> {
    let page = match value {
        Value::Array(_) | Value::Null => MessagePage {
            records: crate::fields::parse_list(value)?,
            ..Default::default()
        },
        other => crate::fields::parse(other)?,
    };
    Ok(page)
}

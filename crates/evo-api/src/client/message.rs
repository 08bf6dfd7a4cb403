use tracing::instrument;

use evolution_sdk_client::{ApiFamily, MultipartPart, RequestBuilder, Result};

use super::{target, EvolutionClient};
use crate::message::{
    MediaType, MessageResponse, SendAudio, SendContact, SendLocation, SendMedia, SendMediaFile,
    SendPoll, SendReaction, SendStatus, SendSticker, SendText,
};
use crate::validate::Validator;

/// Sending messages. Every send returns a [`MessageResponse`]; check
/// [`MessageResponse::is_success`] for whether the server accepted it.
///
/// Sends are retried on transient failures like any other call, so a
/// message can be delivered twice if the server processed an attempt
/// whose response was lost.
#[derive(Debug, Clone, Copy)]
pub struct MessageApi<'a> {
    client: &'a EvolutionClient,
}

impl<'a> MessageApi<'a> {
    pub(crate) fn new(client: &'a EvolutionClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, payload), fields(number = %payload.number))]
    pub async fn send_text(&self, instance: &str, payload: SendText) -> Result<MessageResponse> {
        let mut check = Validator::new();
        check
            .instance(target(instance))
            .recipient("number", &payload.number)
            .not_empty("text", &payload.text);
        self.post(instance, "sendText", &payload, check, ApiFamily::Message)
            .await
    }

    /// Send media by URL or base64 data.
    #[instrument(skip(self, payload), fields(number = %payload.number, mediatype = %payload.mediatype))]
    pub async fn send_media(&self, instance: &str, payload: SendMedia) -> Result<MessageResponse> {
        let mut check = Validator::new();
        check
            .instance(target(instance))
            .recipient("number", &payload.number)
            .not_empty("media", &payload.media);
        self.post(instance, "sendMedia", &payload, check, ApiFamily::Media)
            .await
    }

    /// Upload a file as multipart form data.
    #[instrument(skip(self, payload), fields(number = %payload.number, file = %payload.file_name))]
    pub async fn send_media_file(&self, instance: &str, payload: SendMediaFile) -> Result<MessageResponse> {
        let mut check = Validator::new();
        check
            .instance(target(instance))
            .recipient("number", &payload.number)
            .not_empty("fileName", &payload.file_name);
        check.not_empty_list("file", &payload.data[..]);
        check.finish().map_err(|e| e.in_family(ApiFamily::Media))?;

        let file = MultipartPart::file("file", payload.file_name.as_str(), payload.data);
        let mediatype = match (&payload.mediatype, &file) {
            (Some(mediatype), _) => mediatype.clone(),
            (None, MultipartPart::File { mime, .. }) => MediaType::from_mime(mime),
            (None, MultipartPart::Text { .. }) => MediaType::Document,
        };

        let mut parts = vec![
            MultipartPart::text("number", payload.number.as_str()),
            MultipartPart::text("mediatype", mediatype.as_str()),
            MultipartPart::text("fileName", payload.file_name.as_str()),
        ];
        if let Some(caption) = &payload.caption {
            parts.push(MultipartPart::text("caption", caption.as_str()));
        }
        if let Some(delay) = payload.delay {
            parts.push(MultipartPart::text("delay", delay.to_string()));
        }
        parts.push(file);

        let request = RequestBuilder::post("/message/sendMedia/{instance}")
            .maybe_instance(target(instance))
            .multipart(parts);
        self.client.fetch(request, ApiFamily::Media).await
    }

    /// Send a voice note.
    #[instrument(skip(self, payload), fields(number = %payload.number))]
    pub async fn send_audio(&self, instance: &str, payload: SendAudio) -> Result<MessageResponse> {
        let mut check = Validator::new();
        check
            .instance(target(instance))
            .recipient("number", &payload.number)
            .not_empty("audio", &payload.audio);
        self.post(instance, "sendWhatsAppAudio", &payload, check, ApiFamily::Media)
            .await
    }

    #[instrument(skip(self, payload), fields(number = %payload.number))]
    pub async fn send_sticker(&self, instance: &str, payload: SendSticker) -> Result<MessageResponse> {
        let mut check = Validator::new();
        check
            .instance(target(instance))
            .recipient("number", &payload.number)
            .not_empty("sticker", &payload.sticker);
        self.post(instance, "sendSticker", &payload, check, ApiFamily::Media)
            .await
    }

    #[instrument(skip(self, payload), fields(number = %payload.number))]
    pub async fn send_location(&self, instance: &str, payload: SendLocation) -> Result<MessageResponse> {
        let mut check = Validator::new();
        check
            .instance(target(instance))
            .recipient("number", &payload.number)
            .latitude(payload.latitude)
            .longitude(payload.longitude);
        self.post(instance, "sendLocation", &payload, check, ApiFamily::Message)
            .await
    }

    #[instrument(skip(self, payload), fields(number = %payload.number))]
    pub async fn send_contact(&self, instance: &str, payload: SendContact) -> Result<MessageResponse> {
        let mut check = Validator::new();
        check
            .instance(target(instance))
            .recipient("number", &payload.number)
            .not_empty_list("contact", &payload.contacts);
        for (index, card) in payload.contacts.iter().enumerate() {
            check.not_empty(&format!("contact[{index}].fullName"), &card.full_name);
            check.not_empty(&format!("contact[{index}].phoneNumber"), &card.phone_number);
        }
        self.post(instance, "sendContact", &payload, check, ApiFamily::Message)
            .await
    }

    /// React to a message. An empty reaction removes the current one.
    #[instrument(skip(self, payload))]
    pub async fn send_reaction(&self, instance: &str, payload: SendReaction) -> Result<MessageResponse> {
        let mut check = Validator::new();
        check
            .instance(target(instance))
            .not_empty("key.remoteJid", payload.key.remote_jid.as_deref().unwrap_or_default())
            .not_empty("key.id", payload.key.id.as_deref().unwrap_or_default());
        self.post(instance, "sendReaction", &payload, check, ApiFamily::Message)
            .await
    }

    /// Send a poll with 2 to 12 options.
    #[instrument(skip(self, payload), fields(number = %payload.number))]
    pub async fn send_poll(&self, instance: &str, payload: SendPoll) -> Result<MessageResponse> {
        let options = payload.values.len() as u32;
        let mut check = Validator::new();
        check
            .instance(target(instance))
            .recipient("number", &payload.number)
            .not_empty("name", &payload.name)
            .range("values", options, 2, 12)
            .range("selectableCount", payload.selectable_count, 1, options.max(1));
        self.post(instance, "sendPoll", &payload, check, ApiFamily::Message)
            .await
    }

    /// Post a status (story).
    #[instrument(skip(self, payload), fields(kind = %payload.kind))]
    pub async fn send_status(&self, instance: &str, payload: SendStatus) -> Result<MessageResponse> {
        let mut check = Validator::new();
        check
            .instance(target(instance))
            .not_empty("content", &payload.content);
        if !payload.all_contacts {
            check.recipients("statusJidList", &payload.status_jid_list);
        }
        self.post(instance, "sendStatus", &payload, check, ApiFamily::Message)
            .await
    }

    async fn post<T: serde::Serialize>(
        &self,
        instance: &str,
        endpoint: &str,
        payload: &T,
        mut check: Validator,
        family: ApiFamily,
    ) -> Result<MessageResponse> {
        check.finish().map_err(|e| e.in_family(family))?;
        let request = RequestBuilder::post(format!("/message/{endpoint}/{{instance}}"))
            .maybe_instance(target(instance))
            .json(payload)?;
        self.client.fetch(request, family).await
    }
}

//! Blocking Evolution API client.
//!
//! Mirrors [`crate::EvolutionClient`] method for method. Each client owns a
//! single-threaded tokio runtime and drives every call to completion on it.
//!
//! Do not use it from inside an async runtime: `block_on` panics there. Use
//! the async client instead.
//!
//! ```rust,ignore
//! use evolution_sdk_api::blocking::EvolutionClient;
//! use evolution_sdk_api::message::SendText;
//!
//! let client = EvolutionClient::from_env()?;
//! let state = client.instance().connection_state("demo")?;
//! if state.is_open() {
//!     client.messages().send_text("demo", SendText::new("5511999999999", "Hello!"))?;
//! }
//! ```

use std::time::Duration;

use tokio::runtime::{Builder, Runtime};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use evolution_sdk_client::{ClientConfig, Error, ErrorKind, Result};

use crate::ack::Ack;
use crate::chat::{
    Chat, Contact, MediaData, MessagePage, MessageQuery, Presence, ProfilePictureUrl,
    WhatsAppNumber,
};
use crate::group::{
    CreateGroup, Ephemeral, Group, GroupParticipant, GroupSetting, InviteCode, ParticipantAction,
    ParticipantUpdate,
};
use crate::instance::{
    ConnectionState, ConnectionStateResponse, CreateInstance, FetchInstancesFilter, Instance,
    InstanceResponse, InstanceSettings,
};
use crate::message::{
    MessageKey, MessageResponse, SendAudio, SendContact, SendLocation, SendMedia, SendMediaFile,
    SendPoll, SendReaction, SendSticker, SendStatus, SendText,
};
use crate::profile::{BusinessProfile, PrivacySettings, Profile};
use crate::webhook::{RabbitmqConfig, SqsConfig, WebhookConfig, WebsocketConfig};

/// Blocking Evolution API client.
#[derive(Debug)]
pub struct EvolutionClient {
    runtime: Runtime,
    inner: crate::EvolutionClient,
}

impl EvolutionClient {
    /// Create a client from a configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build().map_err(|e| {
            Error::new(ErrorKind::Config(format!("failed to start runtime: {e}")))
        })?;
        let inner = crate::EvolutionClient::new(config)?;
        Ok(Self { runtime, inner })
    }

    /// Create a client configured from `EVOLUTION_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// The async client this one drives.
    pub fn inner(&self) -> &crate::EvolutionClient {
        &self.inner
    }

    pub fn config(&self) -> &ClientConfig {
        self.inner.config()
    }

    /// Abort calls when `token` is cancelled, for example from another thread.
    pub fn set_cancellation(&mut self, token: CancellationToken) {
        self.inner = self.inner.with_cancellation(token);
    }

    /// Returns true if the server answers. Never fails.
    pub fn health_check(&self) -> bool {
        self.runtime.block_on(self.inner.health_check())
    }

    /// Release the client and its runtime.
    pub fn close(self) {
        debug!("Closing blocking Evolution client");
        self.inner.close();
    }

    pub fn instance(&self) -> InstanceApi<'_> {
        InstanceApi { client: self }
    }

    pub fn instances(&self) -> InstanceApi<'_> {
        self.instance()
    }

    pub fn messages(&self) -> MessageApi<'_> {
        MessageApi { client: self }
    }

    pub fn message(&self) -> MessageApi<'_> {
        self.messages()
    }

    pub fn chat(&self) -> ChatApi<'_> {
        ChatApi { client: self }
    }

    pub fn group(&self) -> GroupApi<'_> {
        GroupApi { client: self }
    }

    pub fn profile(&self) -> ProfileApi<'_> {
        ProfileApi { client: self }
    }

    pub fn webhook(&self) -> WebhookApi<'_> {
        WebhookApi { client: self }
    }
}

/// Generate a blocking handle whose methods run the async handle's
/// method of the same name on the client's runtime.
macro_rules! blocking_api {
    (
        $(#[$meta:meta])*
        $name:ident => $accessor:ident {
            $(
                $(#[$fmeta:meta])*
                fn $method:ident($($arg:ident: $ty:ty),*) -> $ret:ty;
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name<'a> {
            client: &'a EvolutionClient,
        }

        impl<'a> $name<'a> {
            $(
                $(#[$fmeta])*
                pub fn $method(&self, $($arg: $ty),*) -> Result<$ret> {
                    let client = self.client;
                    client.runtime.block_on(client.inner.$accessor().$method($($arg),*))
                }
            )+
        }
    };
}

blocking_api! {
    /// Blocking [`crate::InstanceApi`].
    InstanceApi => instance {
        fn create(name: &str, options: CreateInstance) -> InstanceResponse;
        fn fetch_instances(filter: &FetchInstancesFilter) -> Vec<Instance>;
        fn connect(instance: &str, number: Option<&str>) -> InstanceResponse;
        fn restart(instance: &str) -> InstanceResponse;
        fn connection_state(instance: &str) -> ConnectionStateResponse;
        fn logout(instance: &str) -> Ack;
        fn delete(instance: &str) -> Ack;
        fn set_presence(instance: &str, presence: Presence) -> Ack;
        fn set_settings(instance: &str, settings: &InstanceSettings) -> InstanceSettings;
        fn find_settings(instance: &str) -> InstanceSettings;
        /// Blocks the calling thread for up to `timeout`.
        fn wait_for_state(
            instance: &str,
            state: ConnectionState,
            timeout: Duration,
            interval: Duration
        ) -> bool;
    }
}

blocking_api! {
    /// Blocking [`crate::MessageApi`].
    MessageApi => messages {
        fn send_text(instance: &str, payload: SendText) -> MessageResponse;
        fn send_media(instance: &str, payload: SendMedia) -> MessageResponse;
        fn send_media_file(instance: &str, payload: SendMediaFile) -> MessageResponse;
        fn send_audio(instance: &str, payload: SendAudio) -> MessageResponse;
        fn send_sticker(instance: &str, payload: SendSticker) -> MessageResponse;
        fn send_location(instance: &str, payload: SendLocation) -> MessageResponse;
        fn send_contact(instance: &str, payload: SendContact) -> MessageResponse;
        fn send_reaction(instance: &str, payload: SendReaction) -> MessageResponse;
        fn send_poll(instance: &str, payload: SendPoll) -> MessageResponse;
        fn send_status(instance: &str, payload: SendStatus) -> MessageResponse;
    }
}

blocking_api! {
    /// Blocking [`crate::ChatApi`].
    ChatApi => chat {
        fn check_whatsapp_numbers(instance: &str, numbers: &[String]) -> Vec<WhatsAppNumber>;
        fn mark_as_read(instance: &str, keys: &[MessageKey]) -> Ack;
        fn mark_as_unread(instance: &str, chat: &str, last_message: &MessageKey) -> Ack;
        fn archive_chat(instance: &str, chat: &str, last_message: &MessageKey, archive: bool) -> Ack;
        fn delete_message_for_everyone(instance: &str, key: &MessageKey) -> Ack;
        fn update_message(instance: &str, number: &str, key: &MessageKey, text: &str) -> MessageResponse;
        fn send_presence(instance: &str, number: &str, presence: Presence, delay_ms: u32) -> Ack;
        fn fetch_profile_picture_url(instance: &str, number: &str) -> ProfilePictureUrl;
        fn get_base64_from_media_message(instance: &str, message_id: &str, convert_to_mp4: bool) -> MediaData;
        fn find_contacts(instance: &str, id: Option<&str>) -> Vec<Contact>;
        fn find_messages(instance: &str, query: &MessageQuery) -> MessagePage;
        fn find_status_messages(instance: &str, query: &MessageQuery) -> MessagePage;
        fn find_chats(instance: &str) -> Vec<Chat>;
    }
}

blocking_api! {
    /// Blocking [`crate::GroupApi`].
    GroupApi => group {
        fn create(instance: &str, group: CreateGroup) -> Group;
        fn fetch_all_groups(instance: &str, with_participants: bool) -> Vec<Group>;
        fn find_group_info(instance: &str, group_jid: &str) -> Group;
        fn leave(instance: &str, group_jid: &str) -> Ack;
        fn update_picture(instance: &str, group_jid: &str, image: &str) -> Ack;
        fn update_subject(instance: &str, group_jid: &str, subject: &str) -> Ack;
        fn update_description(instance: &str, group_jid: &str, description: &str) -> Ack;
        fn update_setting(instance: &str, group_jid: &str, setting: GroupSetting) -> Ack;
        fn toggle_ephemeral(instance: &str, group_jid: &str, timer: Ephemeral) -> Ack;
        fn invite_code(instance: &str, group_jid: &str) -> InviteCode;
        fn revoke_invite_code(instance: &str, group_jid: &str) -> InviteCode;
        fn send_invite(instance: &str, group_jid: &str, numbers: &[String], description: Option<&str>) -> Ack;
        fn find_by_invite_code(instance: &str, invite_code: &str) -> Group;
        fn participants(instance: &str, group_jid: &str) -> Vec<GroupParticipant>;
        fn update_participants(
            instance: &str,
            group_jid: &str,
            action: ParticipantAction,
            participants: &[String]
        ) -> Vec<ParticipantUpdate>;
    }
}

blocking_api! {
    /// Blocking [`crate::ProfileApi`].
    ProfileApi => profile {
        fn fetch_business_profile(instance: &str, number: &str) -> BusinessProfile;
        fn fetch_profile(instance: &str, number: &str) -> Profile;
        fn update_name(instance: &str, name: &str) -> Ack;
        fn update_status(instance: &str, status: &str) -> Ack;
        fn update_picture(instance: &str, picture: &str) -> Ack;
        fn remove_picture(instance: &str) -> Ack;
        fn fetch_privacy_settings(instance: &str) -> PrivacySettings;
        fn update_privacy_settings(instance: &str, settings: &PrivacySettings) -> Ack;
    }
}

blocking_api! {
    /// Blocking [`crate::WebhookApi`].
    WebhookApi => webhook {
        fn set_webhook(instance: &str, config: &WebhookConfig) -> WebhookConfig;
        fn find_webhook(instance: &str) -> WebhookConfig;
        fn set_websocket(instance: &str, config: &WebsocketConfig) -> WebsocketConfig;
        fn find_websocket(instance: &str) -> WebsocketConfig;
        fn set_rabbitmq(instance: &str, config: &RabbitmqConfig) -> RabbitmqConfig;
        fn find_rabbitmq(instance: &str) -> RabbitmqConfig;
        fn set_sqs(instance: &str, config: &SqsConfig) -> SqsConfig;
        fn find_sqs(instance: &str) -> SqsConfig;
    }
}

//! # evolution-sdk-api
//!
//! Typed resources for the Evolution API, a WhatsApp automation server.
//!
//! - **Instances** - create, connect (QR or pairing code), state, restart, logout, delete
//! - **Messages** - text, media (URL, base64 or multipart upload), audio, stickers,
//!   locations, contacts, reactions, polls, status updates
//! - **Chats** - number checks, read state, archive, history, contacts, media download
//! - **Groups** - metadata, invites, participants, settings
//! - **Profile** - names, pictures, privacy
//! - **Event delivery** - webhook, websocket, RabbitMQ and SQS configuration
//!
//! Calls validate their parameters before anything is sent and parse
//! responses into models that tolerate unknown fields and enum values.
//! A blocking client with the same methods lives in [`blocking`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use evolution_sdk_api::{ClientConfig, EvolutionClient};
//! use evolution_sdk_api::message::SendText;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), evolution_sdk_api::Error> {
//!     let client = EvolutionClient::new(
//!         ClientConfig::builder("http://localhost:8080")
//!             .with_api_key("B6D711FCDE4D4FD5936544120E713976")
//!             .with_default_instance("demo")
//!             .build(),
//!     )?;
//!
//!     let sent = client
//!         .messages()
//!         .send_text("", SendText::new("5511999999999", "Hello from Rust"))
//!         .await?;
//!     println!("sent {:?}", sent.message_id());
//!     Ok(())
//! }
//! ```

#[macro_use]
mod macros;

pub mod ack;
pub mod blocking;
pub mod chat;
mod client;
pub mod fields;
pub mod group;
pub mod instance;
pub mod message;
pub mod profile;
pub mod qrcode;
mod validate;
pub mod webhook;

// Main client and resource handles
pub use client::{ChatApi, EvolutionClient, GroupApi, InstanceApi, MessageApi, ProfileApi, WebhookApi};

// Common models
pub use ack::Ack;
pub use fields::{FieldReader, FromResponse};
pub use qrcode::{QrCode, QrPayload};

// Re-export client types that users need
pub use evolution_sdk_client::{
    ApiFamily, CancellationToken, ClientConfig, ClientConfigBuilder, Error, ErrorKind, Result,
    RetryConfig, ValidationOrigin, Violation,
};

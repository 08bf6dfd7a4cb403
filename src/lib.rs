//! # evolution-sdk
//!
//! A typed Evolution API client library for Rust.
//!
//! The Evolution API is an HTTP server that automates WhatsApp sessions
//! ("instances"). This library wraps it with validated parameters, typed
//! responses, retries with backoff, and both async and blocking clients.
//!
//! ## Security
//!
//! - API keys and instance tokens are redacted in Debug output
//! - Tracing spans skip credential parameters
//! - Error messages from server bodies are sanitized and length capped
//!
//! ## Crates
//!
//! - **evolution-sdk-client** - Core HTTP client: configuration, `apikey` auth, retry, error mapping
//! - **evolution-sdk-api** - Resources: instances, messages, chats, groups, profile, webhooks
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use evolution_sdk::{ClientConfig, EvolutionClient};
//! use evolution_sdk::api::message::SendText;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), evolution_sdk::Error> {
//!     // EVOLUTION_BASE_URL, EVOLUTION_API_KEY, EVOLUTION_INSTANCE_NAME, ...
//!     let client = EvolutionClient::from_env()?;
//!
//!     let created = client.instance().create("demo", Default::default()).await?;
//!     if let Some(qr) = created.qr_base64() {
//!         println!("scan this QR code: {qr}");
//!     }
//!
//!     client
//!         .messages()
//!         .send_text("demo", SendText::new("5511999999999", "Hello!"))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

// Re-export all crates for convenient access
#[cfg(feature = "api")]
pub use evolution_sdk_api as api;
#[cfg(feature = "client")]
pub use evolution_sdk_client as client;

// Re-export commonly used types at the top level
#[cfg(feature = "api")]
pub use evolution_sdk_api::{blocking, EvolutionClient};
#[cfg(feature = "client")]
pub use evolution_sdk_client::{ClientConfig, Error, ErrorKind, EvolutionHttp, Result};

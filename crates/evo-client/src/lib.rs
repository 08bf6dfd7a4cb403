//! # evolution-sdk-client
//!
//! Core HTTP client infrastructure for the Evolution API.
//!
//! This crate provides the foundational HTTP client with:
//! - `apikey` authentication with per-instance tokens
//! - Automatic retry with exponential backoff and jitter
//! - Rate limit detection and Retry-After handling
//! - Cancellation via `tokio_util::sync::CancellationToken`
//! - Compression support (gzip, deflate)
//! - Connection pooling
//! - Request/response tracing
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! │  (evolution-sdk-api resources and models)                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     EvolutionHttp                           │
//! │  - Holds base URL + auth handler + HTTP client              │
//! │  - Resolves `{instance}` paths                              │
//! │  - Attaches the `apikey` header                             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HttpClient                             │
//! │  - Raw HTTP with retry, compression, rate limiting          │
//! │  - Error envelope mapping                                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use evolution_sdk_client::{ClientConfig, EvolutionHttp, RequestBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), evolution_sdk_client::Error> {
//!     let http = EvolutionHttp::new(
//!         ClientConfig::builder("http://localhost:8080")
//!             .with_api_key("B6D711FCDE4D4FD5936544120E713976")
//!             .build(),
//!     )?;
//!
//!     let instances = http
//!         .request(RequestBuilder::get("/instance/fetchInstances"))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

mod auth;
mod client;
mod config;
mod error;
mod evolution_client;
mod request;
mod response;
mod retry;
pub mod security;

pub use auth::{AuthHandler, API_KEY_HEADER};
pub use client::HttpClient;
pub use config::{
    ClientConfig, ClientConfigBuilder, ENV_API_KEY, ENV_BASE_URL, ENV_DEBUG, ENV_INSTANCE_NAME,
    ENV_MAX_RETRIES, ENV_TIMEOUT,
};
pub use error::{ApiFamily, Error, ErrorKind, Result, ValidationOrigin, Violation};
pub use evolution_client::EvolutionHttp;
pub use request::{MultipartPart, RequestBody, RequestBuilder, RequestMethod, INSTANCE_PLACEHOLDER};
pub use response::{parse_retry_after, Response};
pub use retry::{BackoffStrategy, RetryConfig, RetryPolicy};

pub use tokio_util::sync::CancellationToken;

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("evolution-sdk/", env!("CARGO_PKG_VERSION"));

//! netfetch — a multi-protocol fetch engine for a classic-era web browser's
//! network subsystem.
//!
//! Covers the HTTP/1.1 client (request framing, TLS, chunked-transfer and
//! gzip streaming decode, keep-alive connection pooling with stale-connection
//! recovery, redirect and authentication loops, certificate trust prompts,
//! cookie integration) plus a Gemini/Spartan client sharing the same
//! TLS/connection substrate, including its `text/gemini`→HTML streaming
//! converter.
//!
//! # What this crate does NOT do
//!
//! Everything the reference browser treats as an external collaborator stays
//! external here too: rendering/UI, preferences persistence, cookie storage,
//! and the GUI prompts for certificate trust and HTTP authentication are all
//! traits the caller implements ([`Observer`], [`CookieJar`], [`TrustPrompt`],
//! [`AuthPrompt`]). This crate never renders a page or persists anything on
//! its own.
//!
//! # Quick start
//!
//! ```no_run
//! use netfetch::{Client, FetchRequest, ParsedUrl, RecordingObserver};
//!
//! # async fn run() -> Result<(), netfetch::FetchError> {
//! let client = Client::builder().build();
//! let url = ParsedUrl::parse("https://example.com/")?;
//! let mut observer = RecordingObserver::default();
//! client.fetch(FetchRequest::get(url), &mut observer).await?;
//! println!("{}", String::from_utf8_lossy(&observer.body()));
//! # Ok(())
//! # }
//! ```
//!
//! Gemini and Spartan share the same [`Client`]:
//!
//! ```no_run
//! use netfetch::{Client, ParsedUrl, RecordingObserver};
//!
//! # async fn run() -> Result<(), netfetch::FetchError> {
//! let client = Client::builder().build();
//! let url = ParsedUrl::parse("gemini://geminiprotocol.net/")?;
//! let mut observer = RecordingObserver::default();
//! client.fetch_gemini(url, &mut observer).await?;
//! # Ok(())
//! # }
//! ```

mod auth;
mod client;
mod config;
mod cookie;
mod decode;
mod driver;
mod error;
mod gemtext;
mod http;
mod net;
mod observer;
mod request;
mod url;

pub use crate::auth::{AuthPrompt, Authorization, NoAuthPrompt};
pub use crate::client::{Client, ClientBuilder};
pub use crate::config::ClientConfig;
pub use crate::cookie::{CookieJar, NullCookieJar};
pub use crate::error::{DecodeError, FetchError, TcpErrorKind, TlsError};
pub use crate::http::request::{MultipartPart, RequestBody};
pub use crate::http::types::Method;
pub use crate::net::trust::{NoTrustPrompt, TrustPrompt, TrustStore};
pub use crate::observer::{NetStatus, Observer, ObserverEvent};
pub use crate::request::{FetchFlags, FetchRequest};
pub use crate::url::ParsedUrl;

#[cfg(any(test, feature = "test-util"))]
pub use crate::observer::RecordingObserver;

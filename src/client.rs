//! The fetch engine's public entry point: [`Client`] ties the connection
//! pool, trust store, and the external collaborators (§6) to one
//! [`ClientConfig`], and dispatches a [`FetchRequest`] to the HTTP or
//! Gemini/Spartan driver by URL scheme.

use crate::auth::{AuthPrompt, NoAuthPrompt};
use crate::config::ClientConfig;
use crate::cookie::{CookieJar, NullCookieJar};
use crate::driver::{gemini, http};
use crate::error::FetchError;
use crate::net::pool::ConnectionPool;
use crate::net::trust::{NoTrustPrompt, TrustPrompt, TrustStore};
use crate::observer::Observer;
use crate::request::FetchRequest;
use crate::url::ParsedUrl;
use std::sync::Arc;

/// Shared engine state: one `Client` is meant to be constructed once and
/// reused for every fetch a caller makes, so the connection pool and
/// trust store actually get to do their job (§3: both are process-lived
/// and shared across concurrent fetches).
pub struct Client {
    pub(crate) config: ClientConfig,
    pub(crate) pool: ConnectionPool,
    pub(crate) trust_store: TrustStore,
    pub(crate) trust_prompt: Arc<dyn TrustPrompt>,
    pub(crate) auth_prompt: Arc<dyn AuthPrompt>,
    pub(crate) cookie_jar: Arc<dyn CookieJar>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        ClientBuilder::new(config).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new(ClientConfig::default())
    }

    /// Runs one HTTP/1.1 fetch to completion, streaming status and body
    /// updates to `observer` (§4.9). Returns once the observer has
    /// received `Terminate` (on error) or `Eof`+`Terminate` (on success).
    pub async fn fetch(&self, request: FetchRequest, observer: &mut dyn Observer) -> Result<(), FetchError> {
        http::run(self, request, observer).await
    }

    /// Runs one Gemini or Spartan fetch to completion (§4.10). The scheme
    /// on `url` (`gemini://` or `spartan://`) selects the protocol.
    pub async fn fetch_gemini(&self, url: ParsedUrl, observer: &mut dyn Observer) -> Result<(), FetchError> {
        gemini::run(self, url, observer).await
    }

    /// Destroys every idle pooled connection (§4.4 `close_idle_all`),
    /// e.g. on page navigation.
    pub fn close_idle_connections(&self) {
        self.pool.close_idle_all();
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

/// Builder for [`Client`], defaulting every external collaborator to a
/// headless no-op (deny trust prompts, decline auth prompts, no cookie
/// storage) so a caller that only needs plain fetches doesn't have to
/// implement three traits first.
pub struct ClientBuilder {
    config: ClientConfig,
    trust_prompt: Arc<dyn TrustPrompt>,
    auth_prompt: Arc<dyn AuthPrompt>,
    cookie_jar: Arc<dyn CookieJar>,
}

impl ClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            trust_prompt: Arc::new(NoTrustPrompt),
            auth_prompt: Arc::new(NoAuthPrompt),
            cookie_jar: Arc::new(NullCookieJar),
        }
    }

    pub fn trust_prompt(mut self, prompt: impl TrustPrompt + 'static) -> Self {
        self.trust_prompt = Arc::new(prompt);
        self
    }

    pub fn auth_prompt(mut self, prompt: impl AuthPrompt + 'static) -> Self {
        self.auth_prompt = Arc::new(prompt);
        self
    }

    pub fn cookie_jar(mut self, jar: impl CookieJar + 'static) -> Self {
        self.cookie_jar = Arc::new(jar);
        self
    }

    pub fn build(self) -> Client {
        Client {
            pool: ConnectionPool::new(self.config.pool_max_idle, self.config.pool_max_age),
            trust_store: TrustStore::new(),
            config: self.config,
            trust_prompt: self.trust_prompt,
            auth_prompt: self.auth_prompt,
            cookie_jar: self.cookie_jar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_are_headless() {
        let client = Client::builder().build();
        assert_eq!(client.pool.total_idle(), 0);
    }
}

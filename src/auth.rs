//! Basic-auth credential lookup and the external authorization callback.

use base64::{engine::general_purpose::STANDARD, Engine};

/// Credentials for one (realm, host) pair, or the proxy.
///
/// Looked up before the first request; populated by [`AuthPrompt`] on a
/// 401/407 challenge and the request retried once.
#[derive(Debug, Clone, Default)]
pub struct Authorization {
    pub realm: Option<String>,
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl Authorization {
    pub fn is_empty(&self) -> bool {
        self.user.is_none()
    }

    /// `base64(user:password)`, for the `Authorization`/`Proxy-Authorization`
    /// header value, or `None` if no credentials are set.
    pub fn basic_header_value(&self) -> Option<String> {
        let user = self.user.as_deref()?;
        let password = self.password.as_deref().unwrap_or("");
        Some(format!(
            "Basic {}",
            STANDARD.encode(format!("{user}:{password}"))
        ))
    }
}

/// GUI/interactive callback invoked on a 401/407 challenge.
///
/// Returning `None` models the user cancelling the prompt; the driver then
/// surfaces a generic auth failure rather than retrying.
#[async_trait::async_trait]
pub trait AuthPrompt: Send + Sync {
    async fn authorize(&self, realm: &str, host: &str, is_proxy: bool) -> Option<(String, String)>;
}

/// An [`AuthPrompt`] that always declines, for callers with no interactive
/// surface.
pub struct NoAuthPrompt;

#[async_trait::async_trait]
impl AuthPrompt for NoAuthPrompt {
    async fn authorize(&self, _realm: &str, _host: &str, _is_proxy: bool) -> Option<(String, String)> {
        None
    }
}

//! The cookie jar external collaborator (spec §3/§6).
//!
//! Cookie storage itself is explicitly out of scope for this crate; the
//! driver only calls `cookies_for` before sending a request and
//! `store_cookie` after receiving `Set-Cookie` headers.

use crate::url::ParsedUrl;
use async_trait::async_trait;

/// External cookie storage, queried and updated per-request.
#[async_trait]
pub trait CookieJar: Send + Sync {
    /// Returns the `Cookie:` header value to send for this URL, if any.
    async fn cookies_for(&self, url: &ParsedUrl, tls: bool) -> Option<String>;

    /// Records a `Set-Cookie` header value observed in a response.
    /// `server_date` is the response's `Date` header, used by jars that
    /// need a reference clock for relative `Max-Age` expiry.
    async fn store_cookie(&self, url: &ParsedUrl, set_cookie: &str, server_date: Option<httpdate::HttpDate>);
}

/// A [`CookieJar`] that never sends or stores cookies.
pub struct NullCookieJar;

#[async_trait]
impl CookieJar for NullCookieJar {
    async fn cookies_for(&self, _url: &ParsedUrl, _tls: bool) -> Option<String> {
        None
    }

    async fn store_cookie(&self, _url: &ParsedUrl, _set_cookie: &str, _server_date: Option<httpdate::HttpDate>) {}
}

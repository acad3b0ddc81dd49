//! The caller-facing input to one fetch (§3 `FetchRequest`).

use crate::http::request::RequestBody;
use crate::http::types::Method;
use crate::url::ParsedUrl;

/// Per-request behavior toggles (§3: "flags {use-TLS, no-cache,
/// warn-on-form-post-over-plain-HTTP, skip-validation}").
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchFlags {
    /// Forces a TLS connection even if the URL scheme doesn't imply one.
    /// Normally redundant with `url.is_tls()`; kept distinct because the
    /// reference client lets a caller upgrade a plain request after a
    /// redirect without re-parsing the URL.
    pub use_tls: bool,
    /// Sends `Pragma: no-cache` and skips any caller-side response cache.
    pub no_cache: bool,
    /// Caller-side hint: warn before submitting a form body over a
    /// non-TLS connection. The core never blocks the request on this —
    /// it's surfaced to the caller to decide, matching a browser's "are
    /// you sure?" prompt rather than a protocol behavior.
    pub warn_on_form_post_over_plain_http: bool,
    /// Skips certificate verification entirely. Exists for callers that
    /// already made their own trust decision (e.g. a pinned-cert client);
    /// the default path always verifies (§4.2).
    pub skip_validation: bool,
}

/// One HTTP fetch's complete input: URL, method, optional body,
/// revalidation hints, and behavior flags.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: ParsedUrl,
    pub method: Method,
    pub body: Option<RequestBody>,
    pub referer: Option<String>,
    pub if_modified_since: Option<String>,
    pub etag: Option<String>,
    pub flags: FetchFlags,
}

impl FetchRequest {
    /// A plain `GET` with no revalidation hints or body.
    pub fn get(url: ParsedUrl) -> Self {
        Self {
            url,
            method: Method::Get,
            body: None,
            referer: None,
            if_modified_since: None,
            etag: None,
            flags: FetchFlags::default(),
        }
    }

    /// A `POST` carrying `body`.
    pub fn post(url: ParsedUrl, body: RequestBody) -> Self {
        Self {
            url,
            method: Method::Post,
            body: Some(body),
            referer: None,
            if_modified_since: None,
            etag: None,
            flags: FetchFlags::default(),
        }
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    /// Sets both revalidation headers; §3 notes ETag takes precedence but
    /// is sent in addition to, not instead of, `If-Modified-Since`.
    pub fn with_revalidation(mut self, if_modified_since: Option<String>, etag: Option<String>) -> Self {
        self.if_modified_since = if_modified_since;
        self.etag = etag;
        self
    }

    pub fn with_no_cache(mut self) -> Self {
        self.flags.no_cache = true;
        self
    }
}

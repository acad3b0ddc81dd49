//! Client configuration: timeouts, pool bounds, and header budgets.
//!
//! Every magic number named by the fetch engine's design lives here as a
//! field with a sensible default, rather than scattered through the driver,
//! so a caller can tune one client for an embedded device and another for
//! a desktop browser without forking the crate.

use std::time::Duration;

/// Top-level tunables for a [`Client`](crate::Client).
///
/// Default values match the reference behavior: 15s socket timeouts, an
/// 8-entry/15s-old connection pool, a 10-redirect cap, and a 16 KiB gzip
/// input buffer.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Per-operation send/recv timeout, applied only after the TCP
    /// connection (and, for TLS, the handshake) completes (default: `15s`).
    pub socket_timeout: Duration,

    /// Maximum idle connections kept per (host, port, tls, via-proxy) key,
    /// and in total (default: `8`).
    pub pool_max_idle: usize,

    /// Maximum age of an idle pooled connection before it is evicted
    /// instead of reused (default: `15s`).
    pub pool_max_age: Duration,

    /// Minimum capacity of the header accumulation buffer; exceeding it
    /// before the CRLFCRLF terminator is found is a fatal
    /// [`HeaderTooLarge`](crate::error::DecodeError::HeaderTooLarge)
    /// (default: `16 KiB`).
    pub header_buffer_min: usize,

    /// Soft budget for request header bytes before the builder switches
    /// from a stack buffer to a heap allocation (default: `7000` bytes).
    pub request_header_budget: usize,

    /// Minimum lifetime size of the gzip inflate input buffer
    /// (default: `16 KiB`).
    pub gzip_input_buffer_min: usize,

    /// Redirect loop guard; 10 or more redirects for one logical fetch is
    /// fatal (default: `10`).
    pub max_redirects: usize,

    /// Maximum Gemini/Spartan redirects followed (default: `5`).
    pub max_gemini_redirects: usize,

    /// `User-Agent` header value. A `{VERSION}` token, if present, is
    /// substituted with `env!("CARGO_PKG_VERSION")` — the "spoof template"
    /// substitution from the request-builder spec.
    pub user_agent: String,

    /// Optional forward-proxy URL. When set, requests are sent in
    /// absolute-URL form, `Connection: close` is used instead of
    /// keep-alive, and TLS origins are reached via `CONNECT` tunneling.
    pub proxy: Option<String>,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            socket_timeout: Duration::from_secs(15),
            pool_max_idle: 8,
            pool_max_age: Duration::from_secs(15),
            header_buffer_min: 16 * 1024,
            request_header_budget: 7000,
            gzip_input_buffer_min: 16 * 1024,
            max_redirects: 10,
            max_gemini_redirects: 5,
            user_agent: concat!("netfetch/", env!("CARGO_PKG_VERSION")).to_string(),
            proxy: None,
            _priv: (),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.socket_timeout, Duration::from_secs(15));
        assert_eq!(cfg.pool_max_idle, 8);
        assert_eq!(cfg.pool_max_age, Duration::from_secs(15));
        assert_eq!(cfg.max_redirects, 10);
        assert_eq!(cfg.header_buffer_min, 16 * 1024);
    }
}

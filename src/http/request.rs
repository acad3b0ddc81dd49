//! Request builder: composes an HTTP/1.1 request in the canonical header
//! order the origin/reference client uses — `User-Agent`, `Accept`,
//! `Accept-Encoding`, `Connection`, `Host`, conditional headers,
//! authorization, `Pragma`, `Referer`, framing, and finally `Cookie`.
//!
//! Builds into a `Vec<u8>` rather than the stack-buffer-then-heap-fallback
//! scheme a request *parser* on the server side uses — a client emits
//! `Cookie`/`Referer` values of unbounded size it doesn't control, so the
//! "soft budget, switch to heap past it" behavior is just an initial
//! `Vec` capacity: small requests never reallocate, oversized ones grow
//! past it exactly once.

use crate::auth::Authorization;
use crate::config::ClientConfig;
use crate::http::types::Method;
use crate::url::ParsedUrl;

/// A request body: form-encoded bytes, or a multipart/form-data part set.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Form(Vec<u8>),
    Multipart { boundary: String, parts: Vec<MultipartPart> },
}

#[derive(Debug, Clone)]
pub struct MultipartPart {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl RequestBody {
    fn content_type(&self) -> String {
        match self {
            RequestBody::Form(_) => "application/x-www-form-urlencoded".to_string(),
            RequestBody::Multipart { boundary, .. } => format!("multipart/form-data; boundary={boundary}"),
        }
    }

    fn encode(&self) -> Vec<u8> {
        match self {
            RequestBody::Form(bytes) => bytes.clone(),
            RequestBody::Multipart { boundary, parts } => {
                let mut out = Vec::new();
                for part in parts {
                    out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
                    out.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"", part.name).as_bytes(),
                    );
                    if let Some(filename) = &part.filename {
                        out.extend_from_slice(format!("; filename=\"{filename}\"").as_bytes());
                    }
                    out.extend_from_slice(b"\r\n");
                    if let Some(ct) = &part.content_type {
                        out.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
                    }
                    out.extend_from_slice(b"\r\n");
                    out.extend_from_slice(&part.data);
                    out.extend_from_slice(b"\r\n");
                }
                out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
                out
            }
        }
    }
}

/// Per-request inputs the builder needs beyond the static `ClientConfig`.
#[derive(Default)]
pub struct BuildOptions<'a> {
    pub via_proxy: bool,
    pub if_modified_since: Option<String>,
    pub etag: Option<&'a str>,
    pub auth: Option<&'a Authorization>,
    pub proxy_auth: Option<&'a Authorization>,
    pub no_cache: bool,
    pub referer: Option<&'a str>,
    pub cookie: Option<&'a str>,
}

/// Builds the start-line, headers, and (for POST) body of an HTTP/1.1
/// request, in canonical header order.
pub fn build(
    cfg: &ClientConfig,
    url: &ParsedUrl,
    method: Method,
    body: Option<&RequestBody>,
    opts: &BuildOptions,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(cfg.request_header_budget);

    let target = url.request_target(opts.via_proxy);
    buf.extend_from_slice(method.as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(target.as_bytes());
    buf.extend_from_slice(b" HTTP/1.1\r\n");

    let user_agent = cfg.user_agent.replace("{VERSION}", env!("CARGO_PKG_VERSION"));
    write_header(&mut buf, "User-Agent", &user_agent);
    write_header(&mut buf, "Accept", "*/*;q=1");
    write_header(&mut buf, "Accept-Encoding", "gzip");

    let keep_alive = !opts.via_proxy;
    write_header(&mut buf, "Connection", if keep_alive { "keep-alive" } else { "close" });

    write_header(&mut buf, "Host", &url.host_header());

    if let Some(ims) = &opts.if_modified_since {
        write_header(&mut buf, "If-Modified-Since", ims);
    }
    if let Some(etag) = opts.etag {
        write_header(&mut buf, "If-None-Match", etag);
    }

    if let Some(auth) = opts.auth {
        if let Some(value) = auth.basic_header_value() {
            write_header(&mut buf, "Authorization", &value);
        }
    }
    if let Some(proxy_auth) = opts.proxy_auth {
        if let Some(value) = proxy_auth.basic_header_value() {
            write_header(&mut buf, "Proxy-Authorization", &value);
        }
    }

    if opts.no_cache {
        write_header(&mut buf, "Pragma", "no-cache");
    }

    if let Some(referer) = opts.referer {
        let truncated = truncate_to_budget(referer, cfg.request_header_budget);
        write_header(&mut buf, "Referer", truncated);
    }

    if let Some(body) = body {
        let encoded = body.encode();
        write_header(&mut buf, "Content-Length", &encoded.len().to_string());
        write_header(&mut buf, "Content-Type", &body.content_type());
        if let Some(cookie) = opts.cookie {
            write_header(&mut buf, "Cookie", cookie);
        }
        buf.extend_from_slice(b"\r\n");
        buf.extend_from_slice(&encoded);
        return buf;
    }

    if let Some(cookie) = opts.cookie {
        write_header(&mut buf, "Cookie", cookie);
    }

    buf.extend_from_slice(b"\r\n");
    buf
}

/// Builds a `CONNECT host:port HTTP/1.1` tunnel request through a forward
/// proxy, for reaching a TLS origin.
pub fn build_connect(host: &str, port: u16, proxy_auth: Option<&Authorization>) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(format!("CONNECT {host}:{port} HTTP/1.1\r\n").as_bytes());
    if let Some(auth) = proxy_auth {
        if let Some(value) = auth.basic_header_value() {
            write_header(&mut buf, "Proxy-Authorization", &value);
        }
    }
    buf.extend_from_slice(b"\r\n");
    buf
}

fn write_header(buf: &mut Vec<u8>, name: &str, value: &str) {
    buf.extend_from_slice(name.as_bytes());
    buf.extend_from_slice(b": ");
    buf.extend_from_slice(value.as_bytes());
    buf.extend_from_slice(b"\r\n");
}

fn truncate_to_budget(value: &str, budget: usize) -> &str {
    if value.len() <= budget {
        value
    } else {
        let mut end = budget.min(value.len());
        while end > 0 && !value.is_char_boundary(end) {
            end -= 1;
        }
        &value[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(url: &str) -> ParsedUrl {
        ParsedUrl::parse(url).unwrap()
    }

    #[test]
    fn canonical_header_order_direct_get() {
        let cfg = ClientConfig::default();
        let url = parse("http://example.com/a?b=1");
        let req = build(&cfg, &url, Method::Get, None, &BuildOptions::default());
        let text = String::from_utf8(req).unwrap();
        let lines: Vec<&str> = text.split("\r\n").collect();

        assert_eq!(lines[0], "GET /a?b=1 HTTP/1.1");
        assert!(lines[1].starts_with("User-Agent:"));
        assert_eq!(lines[2], "Accept: */*;q=1");
        assert_eq!(lines[3], "Accept-Encoding: gzip");
        assert_eq!(lines[4], "Connection: keep-alive");
        assert_eq!(lines[5], "Host: example.com");
        assert_eq!(lines[6], "");
    }

    #[test]
    fn proxy_request_is_absolute_form_and_connection_close() {
        let cfg = ClientConfig::default();
        let url = parse("http://example.com/a");
        let opts = BuildOptions { via_proxy: true, ..Default::default() };
        let req = build(&cfg, &url, Method::Get, None, &opts);
        let text = String::from_utf8(req).unwrap();
        assert!(text.starts_with("GET http://example.com/a HTTP/1.1\r\n"));
        assert!(text.contains("Connection: close\r\n"));
    }

    #[test]
    fn post_form_body_sets_content_length_and_type() {
        let cfg = ClientConfig::default();
        let url = parse("http://example.com/submit");
        let body = RequestBody::Form(b"a=1&b=2".to_vec());
        let req = build(&cfg, &url, Method::Post, Some(&body), &BuildOptions::default());
        let text = String::from_utf8(req).unwrap();
        assert!(text.contains("Content-Length: 7\r\n"));
        assert!(text.contains("Content-Type: application/x-www-form-urlencoded\r\n"));
        assert!(text.ends_with("a=1&b=2"));
    }

    #[test]
    fn etag_sent_in_addition_to_if_modified_since() {
        let cfg = ClientConfig::default();
        let url = parse("http://example.com/a");
        let opts = BuildOptions {
            if_modified_since: Some("Tue, 15 Nov 1994 08:12:31 GMT".to_string()),
            etag: Some("\"abc\""),
            ..Default::default()
        };
        let req = build(&cfg, &url, Method::Get, None, &opts);
        let text = String::from_utf8(req).unwrap();
        assert!(text.contains("If-Modified-Since: Tue, 15 Nov 1994 08:12:31 GMT\r\n"));
        assert!(text.contains("If-None-Match: \"abc\"\r\n"));
    }

    #[test]
    fn referer_truncated_to_header_budget() {
        let mut cfg = ClientConfig::default();
        cfg.request_header_budget = 10;
        let url = parse("http://example.com/a");
        let long_referer = "x".repeat(50);
        let opts = BuildOptions { referer: Some(&long_referer), ..Default::default() };
        let req = build(&cfg, &url, Method::Get, None, &opts);
        let text = String::from_utf8(req).unwrap();
        let line = text.lines().find(|l| l.starts_with("Referer:")).unwrap();
        assert_eq!(line, format!("Referer: {}", "x".repeat(10)));
    }

    #[test]
    fn connect_tunnel_request() {
        let req = build_connect("example.com", 443, None);
        let text = String::from_utf8(req).unwrap();
        assert_eq!(text, "CONNECT example.com:443 HTTP/1.1\r\n\r\n");
    }
}

//! Response reader: line-buffered status-line and header parsing.
//!
//! Accumulates bytes from the socket into a growable buffer until the
//! `CRLFCRLF` (or bare `LFLF`) terminator is found, then parses the
//! status line and header block in one pass. Headers recognized by name
//! are pulled out into typed fields on [`ResponseHead`]; everything else
//! is kept in `other` for completeness (and so a caller inspecting raw
//! headers for a multipart boundary, say, still finds them).

use crate::error::DecodeError;
use crate::http::types::{StatusCode, Version};
use memchr::memmem;

/// The parsed status line and header block of one response.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub version: Version,
    pub status: StatusCode,
    pub reason: String,
    pub content_length: Option<u64>,
    pub transfer_encoding_chunked: bool,
    pub content_encoding_gzip: bool,
    pub connection_close: Option<bool>,
    pub location: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub www_authenticate_realm: Option<String>,
    pub proxy_authenticate_realm: Option<String>,
    pub set_cookie: Vec<String>,
    pub content_type: Option<String>,
    /// `boundary=...` extracted from a `multipart/x-mixed-replace`
    /// `Content-Type`, if present.
    pub multipart_boundary: Option<String>,
    pub other: Vec<(String, String)>,
}

impl ResponseHead {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.other
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `true` if the connection should close after this response, given
    /// the explicit `Connection` header or the version's default.
    pub fn should_close(&self) -> bool {
        self.connection_close
            .unwrap_or(!self.version.default_keep_alive())
    }
}

/// Finds the end of the header block in `buf`.
///
/// Returns `Ok(None)` if the terminator hasn't arrived yet and `buf` is
/// still under `budget`; `Err(HeaderTooLarge)` once it's grown past
/// `budget` without one; otherwise the byte offset just past the
/// terminator.
fn find_header_end(buf: &[u8], budget: usize) -> Result<Option<usize>, DecodeError> {
    if let Some(pos) = memmem::find(buf, b"\r\n\r\n") {
        return Ok(Some(pos + 4));
    }
    if let Some(pos) = memmem::find(buf, b"\n\n") {
        return Ok(Some(pos + 2));
    }
    if buf.len() > budget {
        return Err(DecodeError::HeaderTooLarge);
    }
    Ok(None)
}

/// Attempts to parse a complete status-line + header block out of the
/// front of `buf`.
///
/// Returns `Ok(None)` when more bytes are needed (and `buf` is still
/// within budget), `Ok(Some((head, consumed)))` on success, where
/// `consumed` is the number of bytes of `buf` the head occupied (the
/// remainder is body), or an error on a malformed or oversized head.
pub fn try_parse_head(buf: &[u8], budget: usize) -> Result<Option<(ResponseHead, usize)>, DecodeError> {
    let Some(end) = find_header_end(buf, budget)? else {
        return Ok(None);
    };

    let head_bytes = &buf[..end];
    let text = std::str::from_utf8(head_bytes)
        .map_err(|_| DecodeError::ChunkParse("response head is not valid UTF-8"))?;
    let mut lines = text.split("\r\n").flat_map(|l| l.split('\n'));

    let status_line = lines
        .next()
        .ok_or(DecodeError::ChunkParse("missing status line"))?;
    let (version_str, rest) = status_line
        .split_once(' ')
        .ok_or(DecodeError::ChunkParse("malformed status line"))?;
    let version = Version::from_bytes(version_str.as_bytes())
        .ok_or(DecodeError::ChunkParse("unsupported HTTP version"))?;
    let (code_str, reason) = rest.split_once(' ').unwrap_or((rest, ""));
    let code: u16 = code_str
        .trim()
        .parse()
        .map_err(|_| DecodeError::ChunkParse("malformed status code"))?;

    let mut head = ResponseHead {
        version,
        status: StatusCode(code),
        reason: reason.trim().to_string(),
        content_length: None,
        transfer_encoding_chunked: false,
        content_encoding_gzip: false,
        connection_close: None,
        location: None,
        etag: None,
        last_modified: None,
        www_authenticate_realm: None,
        proxy_authenticate_realm: None,
        set_cookie: Vec::new(),
        content_type: None,
        multipart_boundary: None,
        other: Vec::new(),
    };

    for line in lines {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            return Err(DecodeError::ChunkParse("header line missing ':'"));
        };
        let name = name.trim();
        let value = value.trim();

        if name.eq_ignore_ascii_case("content-length") {
            head.content_length = Some(
                value
                    .parse()
                    .map_err(|_| DecodeError::ChunkParse("malformed Content-Length"))?,
            );
        } else if name.eq_ignore_ascii_case("transfer-encoding") {
            head.transfer_encoding_chunked = value.eq_ignore_ascii_case("chunked");
        } else if name.eq_ignore_ascii_case("content-encoding") {
            head.content_encoding_gzip = value.eq_ignore_ascii_case("gzip");
        } else if name.eq_ignore_ascii_case("connection") {
            head.connection_close = Some(value.eq_ignore_ascii_case("close"));
        } else if name.eq_ignore_ascii_case("location") {
            head.location = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("etag") {
            head.etag = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("last-modified") {
            head.last_modified = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("www-authenticate") {
            head.www_authenticate_realm = extract_realm(value);
        } else if name.eq_ignore_ascii_case("proxy-authenticate") {
            head.proxy_authenticate_realm = extract_realm(value);
        } else if name.eq_ignore_ascii_case("set-cookie") {
            head.set_cookie.push(value.to_string());
        } else if name.eq_ignore_ascii_case("content-type") {
            if value.contains("multipart/x-mixed-replace") {
                head.multipart_boundary = extract_boundary(value);
            }
            head.content_type = Some(value.to_string());
        } else {
            head.other.push((name.to_string(), value.to_string()));
        }
    }

    Ok(Some((head, end)))
}

/// Pulls `realm="..."` out of a `WWW-Authenticate`/`Proxy-Authenticate`
/// challenge header, tolerating a missing or unquoted value.
fn extract_realm(value: &str) -> Option<String> {
    let idx = value.to_ascii_lowercase().find("realm=")?;
    let rest = &value[idx + "realm=".len()..];
    if let Some(stripped) = rest.strip_prefix('"') {
        let end = stripped.find('"')?;
        Some(stripped[..end].to_string())
    } else {
        Some(rest.split(|c| c == ',' || c == ' ').next()?.to_string())
    }
}

fn extract_boundary(content_type: &str) -> Option<String> {
    let idx = content_type.to_ascii_lowercase().find("boundary=")?;
    let rest = &content_type[idx + "boundary=".len()..];
    let rest = rest.trim();
    if let Some(stripped) = rest.strip_prefix('"') {
        let end = stripped.find('"')?;
        Some(stripped[..end].to_string())
    } else {
        Some(rest.split(';').next()?.trim().to_string())
    }
}

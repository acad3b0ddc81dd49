//! The Gemini/Spartan fetch state machine (§4.10). Much smaller than the
//! HTTP driver: one request line, one status+META line, then a body that's
//! either converted from `text/gemini` to HTML on the fly or passed
//! through under its declared MIME type. Connections are never pooled —
//! neither protocol supports persistent connections, so every attempt
//! dials fresh and the transport is dropped once the body completes.

use crate::client::Client;
use crate::error::{DecodeError, FetchError, TcpErrorKind};
use crate::gemtext::{self, GemtextConverter};
use crate::net::socket;
use crate::net::tls as tls_session;
use crate::net::transport::Transport;
use crate::observer::{NetStatus, Observer, ObserverEvent};
use crate::url::{resolve_reference, ParsedUrl};
use memchr::memchr;
use std::time::Duration;

/// META is capped at 256 bytes (§4.10); the status line itself (two or one
/// digit status, a space, META, CRLF) is bounded generously above that so a
/// server that never sends a line terminator can't hold a request open
/// forever.
const MAX_META_LEN: usize = 256;
const STATUS_LINE_CAP: usize = 1024;

pub async fn run(client: &Client, url: ParsedUrl, observer: &mut dyn Observer) -> Result<(), FetchError> {
    let mut current = url;
    let mut redirects = 0usize;

    loop {
        match attempt(client, &current, observer).await {
            Ok(Outcome::Done) => {
                observer.update(ObserverEvent::Eof);
                observer.update(ObserverEvent::Terminate);
                return Ok(());
            }
            Ok(Outcome::Redirect(next)) => {
                redirects += 1;
                if redirects >= client.config().max_gemini_redirects {
                    observer.update(ObserverEvent::Error("gemini redirect loop".to_string()));
                    observer.update(ObserverEvent::Terminate);
                    return Err(FetchError::RedirectLoop);
                }
                current = next;
            }
            Err(e) => {
                observer.update(ObserverEvent::Error(e.to_string()));
                observer.update(ObserverEvent::Terminate);
                return Err(e);
            }
        }
    }
}

enum Outcome {
    Done,
    Redirect(ParsedUrl),
}

async fn attempt(client: &Client, url: &ParsedUrl, observer: &mut dyn Observer) -> Result<Outcome, FetchError> {
    let is_spartan = url.scheme == "spartan";
    let timeout = client.config().socket_timeout;

    observer.update(ObserverEvent::NetStatus(NetStatus::LookingUp));
    let addrs = socket::resolve(&url.host, url.effective_port())
        .await
        .map_err(|_| FetchError::NoHost { host: url.host.clone() })?;

    observer.update(ObserverEvent::NetStatus(NetStatus::Connecting));
    let tcp = socket::connect(&addrs, timeout).await?;

    let mut transport = if is_spartan {
        Transport::plain(tcp)
    } else {
        let session = tls_session::handshake(tcp, &url.host, &client.trust_store, &*client.trust_prompt, false).await?;
        Transport::tls(session.stream)
    };

    let request_line = build_request_line(url, is_spartan);
    observer.update(ObserverEvent::NetStatus(NetStatus::Uploading));
    socket::send(&mut transport, request_line.as_bytes(), timeout).await?;

    observer.update(ObserverEvent::NetStatus(NetStatus::Waiting));
    let (status, meta, leftover) = read_status_line(&mut transport, timeout, is_spartan).await?;

    match status / 10 {
        2 => {
            stream_body(client, &mut transport, url, &meta, is_spartan, leftover, observer).await?;
            Ok(Outcome::Done)
        }
        3 => {
            let target = resolve_reference(url, &meta)?;
            observer.update(ObserverEvent::MovedTo(target.to_string()));
            Ok(Outcome::Redirect(target))
        }
        6 => {
            emit_cert_required_page(observer);
            Ok(Outcome::Done)
        }
        _ => {
            emit_error_page(status, &meta, observer);
            Ok(Outcome::Done)
        }
    }
}

/// Gemini's request is just the absolute URL (`ParsedUrl`'s `Display`
/// produces exactly `scheme://host[:port]path[?query]`); Spartan's is
/// `host[:port] path <input-length>\r\n`, with query stripped (Spartan
/// carries request data out of band, not in the path).
fn build_request_line(url: &ParsedUrl, is_spartan: bool) -> String {
    if is_spartan {
        let (path, _query) = url.path_query();
        let input_length = 0; // no request-body support: GET only.
        match url.port {
            Some(p) if p != url.default_port() => format!("{}:{p} {path} {input_length}\r\n", url.host),
            _ => format!("{} {path} {input_length}\r\n", url.host),
        }
    } else {
        format!("{url}\r\n")
    }
}

async fn read_status_line(
    transport: &mut Transport,
    timeout: Duration,
    is_spartan: bool,
) -> Result<(u16, String, Vec<u8>), FetchError> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 512];
    loop {
        if let Some(pos) = memchr(b'\n', &buf) {
            let mut line_end = pos;
            if line_end > 0 && buf[line_end - 1] == b'\r' {
                line_end -= 1;
            }
            let line = std::str::from_utf8(&buf[..line_end])
                .map_err(|_| FetchError::GeminiStatus("status line is not valid UTF-8"))?;
            let (status, meta) = parse_status_line(line, is_spartan)?;
            return Ok((status, meta, buf[pos + 1..].to_vec()));
        }
        if buf.len() >= STATUS_LINE_CAP {
            return Err(DecodeError::HeaderTooLarge.into());
        }
        let n = socket::recv(transport, &mut chunk, timeout).await?;
        if n == 0 {
            return Err(FetchError::NoConnect(TcpErrorKind::Reset));
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

/// Parses `STATUS<SP>META`. Gemini's status is two decimal digits; Spartan's
/// is one, normalized to the matching Gemini bucket (2→20, 3→30, 4→40,
/// 5→50) so the rest of the driver only ever sees Gemini-shaped codes.
fn parse_status_line(line: &str, is_spartan: bool) -> Result<(u16, String), FetchError> {
    let bytes = line.as_bytes();
    let digits = if is_spartan { 1 } else { 2 };
    if bytes.len() < digits || !bytes[..digits].iter().all(u8::is_ascii_digit) {
        return Err(FetchError::GeminiStatus("missing status code"));
    }
    let mut status: u16 = 0;
    for &b in &bytes[..digits] {
        status = status * 10 + (b - b'0') as u16;
    }
    if bytes.get(digits).copied() != Some(b' ') {
        return Err(FetchError::GeminiStatus("missing space after status code"));
    }

    let status = if is_spartan {
        match status {
            2 => 20,
            3 => 30,
            4 => 40,
            5 => 50,
            other => other * 10,
        }
    } else {
        status
    };

    let mut meta = line[digits + 1..].to_string();
    meta.truncate(MAX_META_LEN);
    Ok((status, meta))
}

/// Streams the body of a 2x response: converted from `text/gemini` (or,
/// for Spartan, any `text/*`) to HTML line by line, or passed through
/// verbatim under its declared MIME type otherwise.
async fn stream_body(
    client: &Client,
    transport: &mut Transport,
    base: &ParsedUrl,
    meta: &str,
    is_spartan: bool,
    leftover: Vec<u8>,
    observer: &mut dyn Observer,
) -> Result<(), FetchError> {
    let timeout = client.config().socket_timeout;
    let convert = meta.starts_with("text/gemini") || (is_spartan && meta.starts_with("text/"));
    observer.update(ObserverEvent::ContentType(if convert { "text/html".to_string() } else { meta.to_string() }));

    if !convert {
        if !leftover.is_empty() {
            observer.update(ObserverEvent::Data(leftover));
        }
        let mut buf = [0u8; 8192];
        loop {
            let n = socket::recv(transport, &mut buf, timeout).await?;
            if n == 0 {
                break;
            }
            observer.update(ObserverEvent::Data(buf[..n].to_vec()));
        }
        return Ok(());
    }

    let mut converter = GemtextConverter::new();
    let mut pending = leftover;
    observer.update(ObserverEvent::Data(gemtext::HTML_HEADER.as_bytes().to_vec()));

    let mut buf = [0u8; 8192];
    loop {
        emit_complete_lines(&mut pending, &mut converter, base, observer);
        let n = socket::recv(transport, &mut buf, timeout).await?;
        if n == 0 {
            break;
        }
        pending.extend_from_slice(&buf[..n]);
    }

    if !pending.is_empty() {
        let line = String::from_utf8_lossy(&pending).into_owned();
        if let Some(html) = converter.convert_line(&line, base) {
            observer.update(ObserverEvent::Data(html.into_bytes()));
        }
    }
    if let Some(close) = converter.finish() {
        observer.update(ObserverEvent::Data(close.into_bytes()));
    }
    observer.update(ObserverEvent::Data(gemtext::HTML_FOOTER.as_bytes().to_vec()));
    Ok(())
}

fn emit_complete_lines(pending: &mut Vec<u8>, converter: &mut GemtextConverter, base: &ParsedUrl, observer: &mut dyn Observer) {
    while let Some(pos) = memchr(b'\n', pending) {
        let mut end = pos;
        if end > 0 && pending[end - 1] == b'\r' {
            end -= 1;
        }
        let line = String::from_utf8_lossy(&pending[..end]).into_owned();
        pending.drain(..=pos);
        if let Some(html) = converter.convert_line(&line, base) {
            observer.update(ObserverEvent::Data(html.into_bytes()));
        }
    }
}

fn emit_error_page(status: u16, meta: &str, observer: &mut dyn Observer) {
    observer.update(ObserverEvent::ContentType("text/html".to_string()));
    let msg = if meta.is_empty() { "Unknown error" } else { meta };
    let body = format!(
        "<html><head><meta charset=\"utf-8\"></head><body><h1>Gemini Error {status}</h1><p>{}</p></body></html>",
        gemtext::escape_html(msg)
    );
    observer.update(ObserverEvent::Data(body.into_bytes()));
}

fn emit_cert_required_page(observer: &mut dyn Observer) {
    observer.update(ObserverEvent::ContentType("text/html".to_string()));
    observer.update(ObserverEvent::Data(
        b"<html><head><meta charset=\"utf-8\"></head><body><h1>Client Certificate Required</h1><p>This Gemini server requires a client certificate, which is not yet supported.</p></body></html>".to_vec(),
    ));
}

//! The error taxonomy surfaced to callers and observers.
//!
//! Mirrors the kinds enumerated for the fetch engine: network-layer
//! failures, TLS failures, decode failures, and the driver-level retry
//! exhaustion cases. Everything that isn't handled internally (stale-reuse
//! retry, auth retry, redirect follow) ends up here.

use std::io;
use thiserror::Error;

/// Socket-layer failures, mapped semantically rather than bit-for-bit from
/// the underlying OS errno.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum TcpErrorKind {
    #[error("operation timed out")]
    Timeout,
    #[error("connection refused")]
    Refused,
    #[error("connection reset")]
    Reset,
    #[error("network unreachable")]
    NetUnreachable,
    #[error("host unreachable")]
    HostUnreachable,
    #[error("no data available yet")]
    TryAgain,
    #[error("other I/O error")]
    Other,
}

impl TcpErrorKind {
    /// Classifies a raw [`io::Error`] into the semantic buckets the driver
    /// branches on. `TryAgain` is not reachable here directly — it is
    /// produced by the TLS layer when the underlying transport needs more
    /// I/O mid-handshake; plain sockets never yield it from a completed
    /// read/write, only from a `WouldBlock` on a non-blocking poll, which
    /// this crate does not use (all socket ops are driven to completion by
    /// `tokio::select!` against a timeout, per the concurrency model).
    pub(crate) fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut => Self::Timeout,
            io::ErrorKind::ConnectionRefused => Self::Refused,
            io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => Self::Reset,
            io::ErrorKind::NotFound | io::ErrorKind::AddrNotAvailable => Self::HostUnreachable,
            io::ErrorKind::WouldBlock => Self::TryAgain,
            _ => Self::Other,
        }
    }
}

/// TLS-session failures.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("certificate verification denied by user or trust store for {host}")]
    CertDenied { host: String },
    #[error("TLS handshake failed: {0}")]
    Handshake(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Body-decoder failures.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("chunk size exceeds 2 GiB or 16 hex digits")]
    ChunkSizeOverflow,
    #[error("malformed chunk framing: {0}")]
    ChunkParse(&'static str),
    #[error("gzip inflate error: {0}")]
    Gzip(String),
    #[error("inflate input buffer exhausted before network produced more data")]
    GzipBufferFull,
    #[error("response body ended before declared Content-Length")]
    ContentLengthShort,
    #[error("response headers exceeded the header buffer budget")]
    HeaderTooLarge,
}

/// Top-level error returned from a fetch, matching spec taxonomy §7.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport library unavailable")]
    NoLibrary,
    #[error("DNS lookup failed for {host}")]
    NoHost { host: String },
    #[error("could not connect: {0}")]
    NoConnect(TcpErrorKind),
    #[error(transparent)]
    Tls(#[from] TlsError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("server rejected POST with status {0}")]
    PostNotSupported(u16),
    #[error("authentication failed after retry")]
    AuthFailed,
    #[error("proxy authentication failed after retry")]
    ProxyAuthFailed,
    #[error("redirect loop: exceeded 10 redirects")]
    RedirectLoop,
    #[error("malformed gemini/spartan status line: {0}")]
    GeminiStatus(&'static str),
    #[error("request cancelled")]
    Cancelled,
    #[error("malformed URL: {0}")]
    InvalidUrl(&'static str),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<TcpErrorKind> for FetchError {
    fn from(kind: TcpErrorKind) -> Self {
        FetchError::NoConnect(kind)
    }
}

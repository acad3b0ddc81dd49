//! TLS session layer (§4.2).
//!
//! Each [`Connection`](crate::net::pool::Connection) gets a freshly created
//! `rustls` client config and session — sessions are never pooled
//! separately from connections, and never reused across requests on a
//! different connection. Construction is serialized by a dedicated lock
//! (§5) to mirror the spec's contract that TLS library state is
//! process-wide and must not be touched concurrently; `rustls` itself
//! needs no such lock (it owns no global mutable state the way the
//! original's AmiSSL wrapper did — see DESIGN.md), but the lock is kept so
//! the crate's concurrency contract matches the spec literally rather than
//! relying on an implementation detail of the TLS backend in use.
//!
//! Cipher policy: TLS 1.2+ only (SSLv2/SSLv3/TLS 1.0/1.1 are not
//! implementable in `rustls` at all, which is a strictly tighter modern
//! equivalent of "TLS ≥ 1.0, HIGH suite excluding NULL/export/DES/3DES/
//! MD5/PSK" — `rustls`'s fixed suite list already excludes all of those).

use crate::error::TlsError;
use crate::net::trust::{TrustPrompt, TrustStore};
use parking_lot::Mutex as SyncMutex;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

static TLS_CREATE_LOCK: SyncMutex<()> = SyncMutex::new(());

/// Records the outcome of standard PKI verification and, on failure, the
/// leaf certificate so the caller can run it past the trust store/GUI
/// after the handshake completes.
struct DeferredVerifier {
    inner: Arc<WebPkiServerVerifier>,
    outcome: SyncMutex<Option<VerifyOutcome>>,
}

enum VerifyOutcome {
    StandardOk,
    NeedsPrompt { subject: String },
}

impl std::fmt::Debug for DeferredVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredVerifier").finish()
    }
}

impl ServerCertVerifier for DeferredVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let standard = self
            .inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now);

        match standard {
            Ok(verified) => {
                *self.outcome.lock() = Some(VerifyOutcome::StandardOk);
                Ok(verified)
            }
            Err(_) => {
                let subject = subject_of(end_entity);
                *self.outcome.lock() = Some(VerifyOutcome::NeedsPrompt { subject });
                // Defer the trust decision to the async trust-store/GUI
                // check run by the driver after the handshake completes
                // (rustls's verifier callback is synchronous and cannot
                // await an interactive prompt).
                Ok(ServerCertVerified::assertion())
            }
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

fn subject_of(der: &CertificateDer<'_>) -> String {
    match x509_parser::parse_x509_certificate(der.as_ref()) {
        Ok((_, cert)) => {
            let cn = cert
                .subject()
                .iter_common_name()
                .next()
                .and_then(|cn| cn.as_str().ok())
                .unwrap_or("unknown");
            format!("/CN={cn}")
        }
        Err(_) => "/CN=unknown".to_string(),
    }
}

/// Builds the trust root set: the OS certificate store first, falling back
/// to (and supplementing with) the bundled Mozilla root list so a host
/// whose OS store is empty or unreadable still verifies ordinary public
/// certificates.
fn root_store() -> RootCertStore {
    let mut store = RootCertStore::empty();
    match rustls_native_certs::load_native_certs() {
        result if !result.certs.is_empty() => {
            for cert in result.certs {
                let _ = store.add(cert);
            }
        }
        _ => {}
    }
    if store.is_empty() {
        store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }
    store
}

/// An established TLS session over a TCP connection.
pub struct TlsSession {
    pub stream: TlsStream<TcpStream>,
    /// The negotiated cipher suite, for the `Cipher` observer attribute.
    pub cipher: String,
}

/// Performs a TLS handshake over `stream`, verifying the peer certificate
/// against the system trust roots first and falling back to the process
/// [`TrustStore`]/[`TrustPrompt`] on failure.
///
/// On denial, returns [`TlsError::CertDenied`]; the caller is responsible
/// for tearing down the underlying `Connection` (§4.2: "both the Session
/// and its Connection are destroyed — never returned to the pool").
///
/// `skip_validation` honors `FetchFlags::skip_validation` (§3): the caller
/// has already made its own trust decision (e.g. a pinned-cert client), so
/// neither the trust store nor the interactive prompt is consulted on a
/// verification failure — the handshake is accepted outright.
pub async fn handshake(
    stream: TcpStream,
    host: &str,
    trust_store: &TrustStore,
    trust_prompt: &dyn TrustPrompt,
    skip_validation: bool,
) -> Result<TlsSession, TlsError> {
    let verifier = {
        let _guard = TLS_CREATE_LOCK.lock();
        Arc::new(DeferredVerifier {
            inner: WebPkiServerVerifier::builder(Arc::new(root_store()))
                .build()
                .map_err(|e| TlsError::Handshake(e.to_string()))?,
            outcome: SyncMutex::new(None),
        })
    };

    let config = {
        let _guard = TLS_CREATE_LOCK.lock();
        ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(verifier.clone())
            .with_no_client_auth()
    };

    let connector = TlsConnector::from(Arc::new(config));
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|_| TlsError::Handshake(format!("invalid SNI host name: {host}")))?;

    let tls_stream = connector
        .connect(server_name, stream)
        .await
        .map_err(|e| TlsError::Handshake(e.to_string()))?;

    let outcome = verifier.outcome.lock().take();
    if let Some(VerifyOutcome::NeedsPrompt { subject }) = outcome {
        if !skip_validation && !trust_store.accept(host, &subject, trust_prompt).await {
            return Err(TlsError::CertDenied { host: host.to_string() });
        }
    }

    let cipher = tls_stream
        .get_ref()
        .1
        .negotiated_cipher_suite()
        .map(|s| format!("{:?}", s.suite()))
        .unwrap_or_else(|| "unknown".to_string());

    Ok(TlsSession {
        stream: tls_stream,
        cipher,
    })
}

/// Sends `close_notify` and shuts the TLS session down, per §4.2's shutdown
/// discipline. Failures here are not propagated — a peer that's already
/// gone is not an error for the purposes of releasing local resources.
pub async fn shutdown(session: &mut TlsSession) {
    use tokio::io::AsyncWriteExt;
    let _ = session.stream.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_of_invalid_der_falls_back() {
        let der = CertificateDer::from(vec![0u8; 4]);
        assert_eq!(subject_of(&der), "/CN=unknown");
    }
}

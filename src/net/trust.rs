//! Process-wide certificate trust store (§3/§4.3).
//!
//! Grows only by user acceptance through [`TrustPrompt`]; never persisted.
//! Guarded by a single lock held only across the lookup+insert — callbacks
//! run without the lock held, per the concurrency model (§5: "Callbacks
//! ... run without any core lock held").

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;

/// Interactive callback consulted on a certificate the trust store hasn't
/// already accepted.
#[async_trait]
pub trait TrustPrompt: Send + Sync {
    async fn trust(&self, host: &str, cert_subject: &str) -> bool;
}

/// A [`TrustPrompt`] that denies everything, for headless callers that
/// want to rely solely on the system root store.
pub struct NoTrustPrompt;

#[async_trait]
impl TrustPrompt for NoTrustPrompt {
    async fn trust(&self, _host: &str, _cert_subject: &str) -> bool {
        false
    }
}

/// The in-memory set of (hostname, certificate-subject) pairs the user has
/// accepted for this process's lifetime.
#[derive(Default)]
pub struct TrustStore {
    accepted: Mutex<HashSet<(String, String)>>,
}

impl TrustStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `(host, cert_subject)` is already accepted,
    /// without prompting.
    pub fn is_trusted(&self, host: &str, cert_subject: &str) -> bool {
        self.accepted
            .lock()
            .contains(&(host.to_string(), cert_subject.to_string()))
    }

    /// Consults the store; on a miss, calls `prompt` (with no lock held)
    /// and records a positive answer.
    pub async fn accept(&self, host: &str, cert_subject: &str, prompt: &dyn TrustPrompt) -> bool {
        if self.is_trusted(host, cert_subject) {
            return true;
        }
        if prompt.trust(host, cert_subject).await {
            self.accepted
                .lock()
                .insert((host.to_string(), cert_subject.to_string()));
            true
        } else {
            false
        }
    }
}

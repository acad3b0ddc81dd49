//! Keep-alive connection pool (§3 `ConnectionPool`, §4.4).
//!
//! Bounded LRU keyed by (normalized host, port, TLS, via-proxy). Proxy
//! connections never share a key with direct connections to the same host
//! — pooling them together would send a CONNECT-tunneled or
//! absolute-form request down a connection dialed the other way (see
//! SPEC_FULL.md §4, grounded on `http.c`'s `ReturnKeepAliveConnection`).
//!
//! The pool lock (`parking_lot::Mutex`) is held only for list edits;
//! destroying evicted connections (which may involve a TLS `close_notify`
//! and socket close) always happens after the lock is released.

use crate::net::transport::Transport;
use crate::url::normalize_host;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// An owned socket, optionally wrapped in TLS.
///
/// Invariant: a `Connection` is either sitting idle in the pool, or held
/// by exactly one in-flight request — it is never shared.
pub struct Connection {
    pub transport: Transport,
    pub host: String,
    pub port: u16,
    pub tls: bool,
    pub via_proxy: bool,
    pub established_at: Instant,
    pub last_used: Instant,
    pub cipher: Option<String>,
}

impl Connection {
    pub fn new(transport: Transport, host: String, port: u16, tls: bool, via_proxy: bool, cipher: Option<String>) -> Self {
        let now = Instant::now();
        Self {
            transport,
            host,
            port,
            tls,
            via_proxy,
            established_at: now,
            last_used: now,
            cipher,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PoolKey {
    host: String,
    port: u16,
    tls: bool,
    via_proxy: bool,
}

impl PoolKey {
    fn new(host: &str, port: u16, tls: bool, via_proxy: bool) -> Self {
        Self {
            host: normalize_host(host),
            port,
            tls,
            via_proxy,
        }
    }
}

struct Idle {
    conn: Connection,
}

/// The shared, process-wide idle-connection cache.
pub struct ConnectionPool {
    idle: Mutex<HashMap<PoolKey, Vec<Idle>>>,
    max_idle: usize,
    max_age: Duration,
}

impl ConnectionPool {
    pub fn new(max_idle: usize, max_age: Duration) -> Self {
        Self {
            idle: Mutex::new(HashMap::new()),
            max_idle,
            max_age,
        }
    }

    /// Total idle connections across all keys, for tests/metrics.
    pub fn total_idle(&self) -> usize {
        self.idle.lock().values().map(Vec::len).sum()
    }

    /// Searches for an idle connection matching `(host, port, tls,
    /// via_proxy)` with normalized-host equality. Entries found to be
    /// stale during the search are dropped (destroyed outside the lock).
    pub fn acquire(&self, host: &str, port: u16, tls: bool, via_proxy: bool, now: Instant) -> Option<Connection> {
        let key = PoolKey::new(host, port, tls, via_proxy);
        let mut stale = Vec::new();
        let found = {
            let mut guard = self.idle.lock();
            let Some(bucket) = guard.get_mut(&key) else {
                return None;
            };

            let mut result = None;
            let mut keep = Vec::with_capacity(bucket.len());
            for idle in bucket.drain(..) {
                if result.is_none() && now.saturating_duration_since(idle.conn.last_used) < self.max_age {
                    result = Some(idle.conn);
                } else if now.saturating_duration_since(idle.conn.last_used) >= self.max_age {
                    stale.push(idle.conn);
                } else {
                    keep.push(idle);
                }
            }
            *bucket = keep;
            if bucket.is_empty() {
                guard.remove(&key);
            }
            result
        };
        drop(stale); // dropped outside the lock; Connection's Drop closes the socket.
        found
    }

    /// Returns a connection to the pool, evicting expired entries and the
    /// pool-wide least-recently-used entry to keep the total idle count
    /// under its bound. If `keepalive_ok` is false the connection is
    /// destroyed instead.
    pub fn release(&self, mut conn: Connection, keepalive_ok: bool, now: Instant) {
        if !keepalive_ok {
            return; // `conn` drops here, closing the socket.
        }
        conn.last_used = now;
        let key = PoolKey::new(&conn.host, conn.port, conn.tls, conn.via_proxy);

        let mut evicted = Vec::new();
        {
            let mut guard = self.idle.lock();

            {
                let bucket = guard.entry(key.clone()).or_default();
                let mut fresh = Vec::with_capacity(bucket.len());
                for idle in bucket.drain(..) {
                    if now.saturating_duration_since(idle.conn.last_used) < self.max_age {
                        fresh.push(idle);
                    } else {
                        evicted.push(idle);
                    }
                }
                *bucket = fresh;
            }
            if guard.get(&key).is_some_and(Vec::is_empty) {
                guard.remove(&key);
            }

            // §3: "total idle entries ≤ 8" is a pool-wide bound, not a
            // per-key one — evict the globally least-recently-used entry
            // (the tail of whichever bucket holds it) until there's room,
            // mirroring `http.c`'s single global `keepalive_pool` list and
            // its `pool_count`-driven eviction (`ReturnKeepAliveConnection`).
            let mut total: usize = guard.values().map(Vec::len).sum();
            while total >= self.max_idle {
                let oldest_key = guard
                    .iter()
                    .filter(|(_, bucket)| !bucket.is_empty())
                    .min_by_key(|(_, bucket)| bucket.last().unwrap().conn.last_used)
                    .map(|(k, _)| k.clone());
                let Some(oldest_key) = oldest_key else { break };
                let bucket = guard.get_mut(&oldest_key).expect("key just found in the same guard");
                evicted.push(bucket.remove(bucket.len() - 1));
                if bucket.is_empty() {
                    guard.remove(&oldest_key);
                }
                total -= 1;
            }

            guard.entry(key).or_default().insert(0, Idle { conn });
        }
        drop(evicted);
    }

    /// Destroys every idle connection (used on page navigation).
    pub fn close_idle_all(&self) {
        let drained: Vec<_> = {
            let mut guard = self.idle.lock();
            guard.drain().collect()
        };
        drop(drained);
    }
}

//! Transport layer: sockets, TLS sessions, the trust store, and the
//! keep-alive connection pool (spec §4.1–§4.4).

pub mod pool;
pub mod socket;
pub mod tls;
pub mod transport;
pub mod trust;

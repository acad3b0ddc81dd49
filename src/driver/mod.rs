//! Protocol state machines (§4.9/§4.10). Both drivers share the socket,
//! TLS, and pool layers under `net/`; everything protocol-specific to one
//! wire format lives in its own module.

pub mod gemini;
pub mod http;

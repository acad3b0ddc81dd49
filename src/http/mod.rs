//! Wire-level HTTP/1.1 types: the request builder and response reader.

pub mod request;
pub mod response;
pub mod types;

//! Streaming body decoders (§4.7/§4.8) and the pipeline that composes them.

pub mod body;
pub mod chunked;
pub mod gzip;

//! Composes the chunked extractor and gzip inflater into the single
//! `network → [chunked] → [gzip] → observer` pipeline (§3 `DecodeContext`,
//! §4.7/§4.8), plus the Content-Length bookkeeping the driver needs to
//! decide when a body is complete.

use crate::decode::chunked::ChunkedDecoder;
use crate::decode::gzip::{GzipDecoder, GzipStatus};
use crate::error::DecodeError;

/// What the driver should do after a [`DecodeContext::feed`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyProgress {
    /// More network bytes are needed before the body is complete.
    NeedMore,
    /// The body is complete. Any bytes of the fed slice past the returned
    /// `consumed` count belong to whatever follows on this connection.
    Complete,
}

/// Streaming decode state for one response body.
///
/// Each filter owns its own scratch buffer (§3: "Each filter has its own
/// scratch buffer"); this struct just wires network bytes through
/// whichever of `chunked`/`gzip` apply, in that order.
pub struct DecodeContext {
    chunked: Option<ChunkedDecoder>,
    gzip: Option<GzipDecoder>,
    /// Declared length of the wire body (compressed, if gzip is also
    /// present; the plain body otherwise) for a non-chunked response.
    /// `None` means "until EOF". A chunked body ignores `Content-Length`
    /// entirely and trusts the chunk framing instead (§9 Open Question:
    /// "prefer chunked and ignore Content-Length", matching modern HTTP).
    declared_len: Option<u64>,
    consumed: u64,
}

impl DecodeContext {
    pub fn new(chunked: bool, gzip: bool, content_length: Option<u64>, gzip_buffer_capacity: usize) -> Self {
        Self {
            chunked: chunked.then(ChunkedDecoder::new),
            gzip: gzip.then(|| GzipDecoder::new(gzip_buffer_capacity)),
            declared_len: if chunked { None } else { content_length },
            consumed: 0,
        }
    }

    /// Bytes of wire body consumed so far (post-chunked-extraction length
    /// when chunked, raw network bytes otherwise) — what a
    /// `content-length-short` check compares against the declared length.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn declared_len(&self) -> Option<u64> {
        self.declared_len
    }

    /// `true` once no more body bytes are expected from the network,
    /// independent of whether an inner gzip stream has itself reached
    /// `Z_STREAM_END` — a chunked+gzip body keeps draining chunks after
    /// inflate finishes (§4.8: "the decoder continues to drain and
    /// discard remaining chunks until the zero-size chunk").
    pub fn is_complete(&self) -> bool {
        match &self.chunked {
            Some(c) => c.is_done(),
            None => self.declared_len.map(|len| self.consumed >= len).unwrap_or(false),
        }
    }

    /// Feeds one network read's worth of bytes through the pipeline,
    /// appending decoded plaintext to `out`. Returns the number of bytes
    /// of `input` consumed — always all of it, unless a non-chunked
    /// body's declared length is reached partway through, in which case
    /// the remainder is surplus (e.g. the start of whatever the server
    /// sends next on a pooled connection) and left for the caller.
    pub fn feed(
        &mut self,
        input: &[u8],
        out: &mut Vec<u8>,
        gzip_chunk_size: usize,
    ) -> Result<(usize, BodyProgress), DecodeError> {
        let input = match (&self.chunked, self.declared_len) {
            (None, Some(len)) => {
                let remaining = len.saturating_sub(self.consumed);
                &input[..(remaining as usize).min(input.len())]
            }
            _ => input,
        };

        let payload = if let Some(chunked) = &mut self.chunked {
            let mut extracted = Vec::new();
            let mut offset = 0;
            while offset < input.len() && !chunked.is_done() {
                let n = chunked.decode(&input[offset..], &mut extracted)?;
                if n == 0 {
                    break;
                }
                offset += n;
            }
            self.consumed += offset as u64;
            extracted
        } else {
            self.consumed += input.len() as u64;
            input.to_vec()
        };

        if let Some(gzip) = &mut self.gzip {
            gzip.feed(&payload)?;
            loop {
                match gzip.decode_into(out, gzip_chunk_size)? {
                    GzipStatus::Progress => continue,
                    GzipStatus::NeedMoreInput | GzipStatus::Finished => break,
                }
            }
        } else {
            out.extend_from_slice(&payload);
        }

        let consumed_from_input = input.len();
        let progress = if self.is_complete() { BodyProgress::Complete } else { BodyProgress::NeedMore };
        Ok((consumed_from_input, progress))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn gzip_bytes(plain: &[u8]) -> Vec<u8> {
        let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(plain).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn plain_body_with_content_length() {
        let mut ctx = DecodeContext::new(false, false, Some(5), 16 * 1024);
        let mut out = Vec::new();
        let (consumed, progress) = ctx.feed(b"hello", &mut out, 4096).unwrap();
        assert_eq!(consumed, 5);
        assert_eq!(progress, BodyProgress::Complete);
        assert_eq!(out, b"hello");
    }

    #[test]
    fn plain_body_caps_at_declared_length_leaving_surplus() {
        let mut ctx = DecodeContext::new(false, false, Some(5), 16 * 1024);
        let mut out = Vec::new();
        let (consumed, progress) = ctx.feed(b"helloXTRA", &mut out, 4096).unwrap();
        assert_eq!(consumed, 5);
        assert_eq!(progress, BodyProgress::Complete);
        assert_eq!(out, b"hello");
    }

    #[test]
    fn chunked_body_ignores_declared_content_length() {
        let mut ctx = DecodeContext::new(true, false, Some(999), 16 * 1024);
        let mut out = Vec::new();
        let (_, progress) = ctx.feed(b"5\r\nhello\r\n0\r\n\r\n", &mut out, 4096).unwrap();
        assert_eq!(progress, BodyProgress::Complete);
        assert_eq!(out, b"hello");
    }

    #[test]
    fn chunked_plus_gzip_straddling_chunk_boundary() {
        let plain = b"The quick brown fox jumps over the lazy dog.";
        let compressed = gzip_bytes(plain);
        // Split the compressed bytes into three chunks so the 3-byte gzip
        // magic straddles the first chunk boundary (scenario 4, §8).
        let a = &compressed[..2];
        let b = &compressed[2..compressed.len() / 2];
        let c = &compressed[compressed.len() / 2..];

        let wire = format!(
            "{:x}\r\n",
            a.len()
        )
        .into_bytes()
        .into_iter()
        .chain(a.iter().copied())
        .chain(*b"\r\n")
        .chain(format!("{:x}\r\n", b.len()).into_bytes())
        .chain(b.iter().copied())
        .chain(*b"\r\n")
        .chain(format!("{:x}\r\n", c.len()).into_bytes())
        .chain(c.iter().copied())
        .chain(*b"\r\n")
        .chain(*b"0\r\n\r\n")
        .collect::<Vec<u8>>();

        let mut ctx = DecodeContext::new(true, true, None, 16 * 1024);
        let mut out = Vec::new();
        ctx.feed(&wire, &mut out, 4096).unwrap();
        assert_eq!(out, plain.to_vec());
    }

    #[test]
    fn gzip_without_chunking_reads_declared_compressed_length() {
        let plain = b"hello, gzip";
        let compressed = gzip_bytes(plain);
        let mut ctx = DecodeContext::new(false, true, Some(compressed.len() as u64), 16 * 1024);
        let mut out = Vec::new();
        let (consumed, progress) = ctx.feed(&compressed, &mut out, 4096).unwrap();
        assert_eq!(consumed, compressed.len());
        assert_eq!(progress, BodyProgress::Complete);
        assert_eq!(out, plain.to_vec());
    }
}

//! Streaming gzip inflate filter (§4.8).
//!
//! Wraps `flate2`'s raw `Decompress` (no zlib header) with a hand-rolled
//! gzip-wrapper parser, because the wrapper magic (`1F 8B 08`) is not
//! guaranteed to land in the first network block of a chunked+gzip body
//! (§4.8: "Gzip magic may not arrive in the very first chunk ... the
//! decoder tolerates this by accumulating chunk payload and searching
//! forward"). `flate2::read::GzDecoder` assumes a synchronous `Read` and
//! can't be suspended mid-header the way this crate's network loop needs.

use crate::error::DecodeError;
use flate2::{Decompress, FlushDecompress, Status};

const GZIP_MAGIC: [u8; 3] = [0x1F, 0x8B, 0x08];

const FHCRC: u8 = 1 << 1;
const FEXTRA: u8 = 1 << 2;
const FNAME: u8 = 1 << 3;
const FCOMMENT: u8 = 1 << 4;

#[derive(Debug, Default, PartialEq, Eq)]
enum HeaderState {
    #[default]
    Searching,
    Done,
}

/// Result of one [`GzipDecoder::decode_into`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GzipStatus {
    /// Made progress this call; the caller should flush `out` and may call
    /// again immediately.
    Progress,
    /// Consumed everything buffered without error; waiting on more network
    /// bytes before more output can be produced.
    NeedMoreInput,
    /// Hit `Z_STREAM_END`. Any bytes left in the scratch buffer are gzip
    /// trailer (CRC32 + ISIZE) or, for a chunked body, belong to a chunk
    /// boundary — neither is this decoder's concern to consume.
    Finished,
}

/// A streaming gzip-wrapper inflate filter.
///
/// Accumulates compressed bytes in a bounded scratch buffer (the "inflate
/// input buffer" of §4.8), parses past the 10+-byte gzip wrapper header
/// once enough of it has arrived, then drives `flate2::Decompress`
/// incrementally with `Z_SYNC_FLUSH` semantics per output buffer.
pub struct GzipDecoder {
    buf: Vec<u8>,
    capacity: usize,
    header: HeaderState,
    inflater: Decompress,
    done: bool,
}

impl GzipDecoder {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            header: HeaderState::default(),
            inflater: Decompress::new(false),
            done: false,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Appends `input` to the scratch buffer. `U` (unconsumed bytes from a
    /// prior call) is always already at the front of `self.buf` — bytes
    /// are drained from the front as they're consumed, never copied
    /// forward — so this call is just the "append `N`" half of §4.8's
    /// buffer discipline; fails if the combined length would exceed
    /// `capacity`.
    pub fn feed(&mut self, input: &[u8]) -> Result<(), DecodeError> {
        if self.buf.len() + input.len() > self.capacity {
            return Err(DecodeError::GzipBufferFull);
        }
        self.buf.extend_from_slice(input);
        Ok(())
    }

    /// Attempts to strip the gzip wrapper header from the front of `buf`,
    /// returning the offset the deflate stream starts at, or `None` if
    /// more bytes are needed to know where that is.
    fn try_parse_header(buf: &[u8]) -> Option<usize> {
        let magic_at = buf.windows(GZIP_MAGIC.len()).position(|w| w == GZIP_MAGIC)?;
        let after_cm = magic_at + GZIP_MAGIC.len();
        // FLG + MTIME(4) + XFL + OS = 7 more fixed bytes after CM.
        let flg = *buf.get(after_cm)?;
        let mut offset = after_cm + 7;

        if flg & FEXTRA != 0 {
            let lo = *buf.get(offset)?;
            let hi = *buf.get(offset + 1)?;
            let xlen = u16::from_le_bytes([lo, hi]) as usize;
            offset += 2 + xlen;
        }
        if flg & FNAME != 0 {
            offset += buf.get(offset..)?.iter().position(|&b| b == 0)? + 1;
        }
        if flg & FCOMMENT != 0 {
            offset += buf.get(offset..)?.iter().position(|&b| b == 0)? + 1;
        }
        if flg & FHCRC != 0 {
            offset += 2;
        }
        if buf.len() < offset {
            return None;
        }
        Some(offset)
    }

    /// Inflates as much of the buffered input as fits in a `chunk_size`
    /// scratch region, appending decoded bytes to `out`.
    pub fn decode_into(&mut self, out: &mut Vec<u8>, chunk_size: usize) -> Result<GzipStatus, DecodeError> {
        if self.done {
            return Ok(GzipStatus::Finished);
        }

        if self.header == HeaderState::Searching {
            match Self::try_parse_header(&self.buf) {
                Some(offset) => {
                    self.buf.drain(..offset);
                    self.header = HeaderState::Done;
                }
                None => return Ok(GzipStatus::NeedMoreInput),
            }
        }

        let mut scratch = vec![0u8; chunk_size.max(1024)];
        let mut progressed = false;
        loop {
            let before_in = self.inflater.total_in();
            let before_out = self.inflater.total_out();
            let status = self
                .inflater
                .decompress(&self.buf, &mut scratch, FlushDecompress::Sync)
                .map_err(|e| DecodeError::Gzip(e.to_string()))?;

            let consumed = (self.inflater.total_in() - before_in) as usize;
            let produced = (self.inflater.total_out() - before_out) as usize;
            if produced > 0 {
                out.extend_from_slice(&scratch[..produced]);
                progressed = true;
            }
            if consumed > 0 {
                self.buf.drain(..consumed);
            }

            match status {
                Status::StreamEnd => {
                    self.done = true;
                    return Ok(GzipStatus::Finished);
                }
                Status::Ok => {
                    if consumed == 0 && produced == 0 {
                        return Ok(GzipStatus::NeedMoreInput);
                    }
                    if self.buf.is_empty() || produced == scratch.len() {
                        return Ok(GzipStatus::Progress);
                    }
                    // More buffered input and output room remain; keep
                    // draining in this call rather than making the caller
                    // spin for no reason.
                }
                Status::BufError => {
                    // Output full for this call (§4.8: "on Z_BUF_ERROR the
                    // observer is flushed and inflate is called again").
                    return Ok(if progressed { GzipStatus::Progress } else { GzipStatus::NeedMoreInput });
                }
            }
        }
    }
}

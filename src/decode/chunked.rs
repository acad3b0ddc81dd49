//! Streaming chunked-transfer-encoding decoder.
//!
//! Network reads arrive in arbitrary-sized blocks that rarely line up
//! with chunk boundaries, so the decoder is a small state machine that
//! can suspend mid chunk-size, mid chunk-data, or mid trailer and resume
//! on the next [`ChunkedDecoder::decode`] call with the next block.
//! Chunk size is capped at 16 hex digits and 2 GiB, matching the
//! engine's refusal to trust a server claiming an implausibly large
//! chunk.

use crate::error::DecodeError;
use std::mem;

const MAX_HEX_DIGITS: u32 = 16;
const MAX_CHUNK_SIZE: u64 = 0x7FFF_FFFF;

#[derive(Debug, Default)]
enum State {
    Size { digits: u32, value: u64 },
    SizeExt { value: u64 },
    SizeCr { value: u64 },
    Data { remaining: u64 },
    DataCr,
    DataLf,
    /// `saw_content` is set once a non-CR/LF byte has been read on the
    /// current trailer line; only a bare (empty) line ends the trailer
    /// block, so a line that saw content loops back to a fresh
    /// `TrailerLine` after its own CRLF instead of reaching `Done`.
    TrailerLine { saw_content: bool },
    TrailerCr { saw_content: bool },
    #[default]
    Done,
}

/// Decodes a `Transfer-Encoding: chunked` body incrementally.
pub struct ChunkedDecoder {
    state: State,
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self { state: State::Size { digits: 0, value: 0 } }
    }

    /// `true` once the terminating zero-size chunk and its trailer block
    /// have both been consumed.
    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Done)
    }

    /// Consumes as much of `input` as forms complete chunk framing,
    /// appending decoded data bytes to `out` in place. Returns the
    /// number of bytes consumed from the front of `input`; the caller
    /// feeds back whatever wasn't consumed (there will be none, except
    /// when `is_done()` becomes true mid-buffer, e.g. trailing bytes
    /// after the terminator that belong to a reused connection).
    pub fn decode(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<usize, DecodeError> {
        let mut i = 0;
        while i < input.len() && !self.is_done() {
            match mem::take(&mut self.state) {
                State::Size { mut digits, mut value } => {
                    let b = input[i];
                    match b {
                        b'0'..=b'9' | b'a'..=b'f' | b'A'..=b'F' => {
                            digits += 1;
                            if digits > MAX_HEX_DIGITS {
                                return Err(DecodeError::ChunkSizeOverflow);
                            }
                            let digit = (b as char).to_digit(16).unwrap() as u64;
                            value = value
                                .checked_mul(16)
                                .and_then(|v| v.checked_add(digit))
                                .filter(|v| *v <= MAX_CHUNK_SIZE)
                                .ok_or(DecodeError::ChunkSizeOverflow)?;
                            i += 1;
                            self.state = State::Size { digits, value };
                        }
                        b';' => {
                            i += 1;
                            self.state = State::SizeExt { value };
                        }
                        b'\r' => {
                            i += 1;
                            self.state = State::SizeCr { value };
                        }
                        b'\n' => {
                            i += 1;
                            self.state = state_after_size(value);
                        }
                        _ => return Err(DecodeError::ChunkParse("invalid chunk-size character")),
                    }
                }
                State::SizeExt { value } => {
                    let b = input[i];
                    i += 1;
                    self.state = match b {
                        b'\r' => State::SizeCr { value },
                        b'\n' => state_after_size(value),
                        _ => State::SizeExt { value },
                    };
                }
                State::SizeCr { value } => {
                    let b = input[i];
                    i += 1;
                    if b != b'\n' {
                        return Err(DecodeError::ChunkParse("expected LF after CR in chunk size"));
                    }
                    self.state = state_after_size(value);
                }
                State::Data { remaining } => {
                    if remaining == 0 {
                        self.state = State::DataCr;
                        continue;
                    }
                    let available = (input.len() - i) as u64;
                    let take = available.min(remaining);
                    out.extend_from_slice(&input[i..i + take as usize]);
                    i += take as usize;
                    let left = remaining - take;
                    self.state = if left == 0 { State::DataCr } else { State::Data { remaining: left } };
                }
                State::DataCr => {
                    let b = input[i];
                    i += 1;
                    if b != b'\r' {
                        return Err(DecodeError::ChunkParse("expected CR after chunk data"));
                    }
                    self.state = State::DataLf;
                }
                State::DataLf => {
                    let b = input[i];
                    i += 1;
                    if b != b'\n' {
                        return Err(DecodeError::ChunkParse("expected LF after chunk data CR"));
                    }
                    self.state = State::Size { digits: 0, value: 0 };
                }
                State::TrailerLine { saw_content } => {
                    let b = input[i];
                    i += 1;
                    self.state = match b {
                        b'\r' => State::TrailerCr { saw_content },
                        b'\n' if saw_content => State::TrailerLine { saw_content: false },
                        b'\n' => State::Done,
                        _ => State::TrailerLine { saw_content: true },
                    };
                }
                State::TrailerCr { saw_content } => {
                    let b = input[i];
                    i += 1;
                    if b != b'\n' {
                        return Err(DecodeError::ChunkParse("expected LF after trailer CR"));
                    }
                    self.state = if saw_content {
                        State::TrailerLine { saw_content: false }
                    } else {
                        State::Done
                    };
                }
                State::Done => unreachable!("loop guard checks is_done()"),
            }
        }
        Ok(i)
    }

}

/// After a bare `\n` ends the size line, decide whether we're moving into
/// chunk data or the terminating trailer block.
fn state_after_size(value: u64) -> State {
    if value == 0 {
        State::TrailerLine { saw_content: false }
    } else {
        State::Data { remaining: value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(input: &[u8]) -> (Vec<u8>, bool) {
        let mut dec = ChunkedDecoder::new();
        let mut out = Vec::new();
        let mut consumed_total = 0;
        while consumed_total < input.len() && !dec.is_done() {
            let consumed = dec.decode(&input[consumed_total..], &mut out).unwrap();
            if consumed == 0 {
                break;
            }
            consumed_total += consumed;
        }
        (out, dec.is_done())
    }

    #[test]
    fn decodes_single_chunk() {
        let (out, done) = decode_all(b"5\r\nhello\r\n0\r\n\r\n");
        assert_eq!(out, b"hello");
        assert!(done);
    }

    #[test]
    fn decodes_multiple_chunks() {
        let (out, done) = decode_all(b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n");
        assert_eq!(out, b"Wikipedia");
        assert!(done);
    }

    #[test]
    fn tolerates_arbitrary_split_points() {
        let full = b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n".to_vec();
        for split in 0..full.len() {
            let mut dec = ChunkedDecoder::new();
            let mut out = Vec::new();
            let mut consumed_total = 0;
            let parts = [&full[..split], &full[split..]];
            for part in parts {
                let mut offset = 0;
                while offset < part.len() {
                    let consumed = dec.decode(&part[offset..], &mut out).unwrap();
                    if consumed == 0 {
                        break;
                    }
                    offset += consumed;
                    consumed_total += consumed;
                }
            }
            assert_eq!(out, b"Wikipedia", "failed at split {split}");
            assert!(dec.is_done(), "not done at split {split}, consumed {consumed_total}");
        }
    }

    #[test]
    fn chunk_extension_is_ignored() {
        let (out, done) = decode_all(b"5;ext=1\r\nhello\r\n0\r\n\r\n");
        assert_eq!(out, b"hello");
        assert!(done);
    }

    #[test]
    fn trailer_headers_are_skipped() {
        let (out, done) = decode_all(b"5\r\nhello\r\n0\r\nX-Trailer: value\r\n\r\n");
        assert_eq!(out, b"hello");
        assert!(done);
    }

    #[test]
    fn multiple_trailer_fields_are_fully_consumed() {
        let full = b"5\r\nhello\r\n0\r\nX-Trailer: one\r\nX-Other: two\r\n\r\nNEXT".to_vec();
        let mut dec = ChunkedDecoder::new();
        let mut out = Vec::new();
        let mut consumed_total = 0;
        while consumed_total < full.len() && !dec.is_done() {
            let consumed = dec.decode(&full[consumed_total..], &mut out).unwrap();
            if consumed == 0 {
                break;
            }
            consumed_total += consumed;
        }
        assert_eq!(out, b"hello");
        assert!(dec.is_done());
        // Only the chunked framing (trailer block included) is consumed;
        // bytes belonging to whatever follows on a reused connection are
        // left for the caller, proving the second trailer line didn't get
        // mistaken for the block's terminating blank line.
        assert_eq!(&full[consumed_total..], b"NEXT");
    }

    #[test]
    fn trailer_field_split_across_reads_does_not_end_early() {
        let full = b"0\r\nX-Trailer: value\r\n\r\n".to_vec();
        for split in 0..full.len() {
            let mut dec = ChunkedDecoder::new();
            let mut out = Vec::new();
            let mut consumed_total = 0;
            for part in [&full[..split], &full[split..]] {
                let mut offset = 0;
                while offset < part.len() {
                    let consumed = dec.decode(&part[offset..], &mut out).unwrap();
                    if consumed == 0 {
                        break;
                    }
                    offset += consumed;
                    consumed_total += consumed;
                }
            }
            assert!(dec.is_done(), "not done at split {split}");
            assert_eq!(consumed_total, full.len(), "under-consumed at split {split}");
        }
    }

    #[test]
    fn rejects_chunk_size_over_16_hex_digits() {
        let mut dec = ChunkedDecoder::new();
        let mut out = Vec::new();
        let err = dec.decode(b"11111111111111111\r\n", &mut out).unwrap_err();
        assert!(matches!(err, DecodeError::ChunkSizeOverflow));
    }

    #[test]
    fn rejects_chunk_size_over_2gib() {
        let mut dec = ChunkedDecoder::new();
        let mut out = Vec::new();
        let err = dec.decode(b"80000000\r\n", &mut out).unwrap_err();
        assert!(matches!(err, DecodeError::ChunkSizeOverflow));
    }

    #[test]
    fn zero_length_body_is_done_immediately() {
        let (out, done) = decode_all(b"0\r\n\r\n");
        assert!(out.is_empty());
        assert!(done);
    }
}

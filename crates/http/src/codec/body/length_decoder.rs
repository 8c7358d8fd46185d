//! Decoder for request bodies framed by `Content-Length`.
//!
//! See [RFC 7230 Section 3.3.2](https://tools.ietf.org/html/rfc7230#section-3.3.2).

use crate::buffer::RingBuffer;
use crate::codec::body::Decoded;
use crate::protocol::ParseError;
use tracing::trace;

/// Tracks the bytes still owed by a fixed-length body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    /// The number of bytes remaining to be read from the payload
    length: u64,
}

impl LengthDecoder {
    pub fn new(length: u64) -> Self {
        Self { length }
    }

    pub fn remaining(&self) -> u64 {
        self.length
    }

    /// Copies at most the remaining length from `src` into `dst`.
    ///
    /// Running out of input at end of stream before the length is reached is
    /// an error.
    pub fn decode(&mut self, src: &mut RingBuffer, dst: &mut [u8]) -> Result<Decoded, ParseError> {
        if self.length == 0 {
            return Ok(Decoded::Eof);
        }

        if src.is_empty() {
            if src.is_eof() {
                return Err(ParseError::UnexpectedEof);
            }
            return Ok(Decoded::NeedMore);
        }

        let len = usize::try_from(self.length).unwrap_or(usize::MAX).min(dst.len());
        let read = src.read_bytes(&mut dst[..len]);
        self.length -= read as u64;
        trace!(len = read, remaining = self.length, "read fixed length bytes");
        Ok(Decoded::Data(read))
    }
}

//! Decoder for request payloads.
//!
//! Selects between the supported framings:
//! - Content-Length based payloads
//! - Chunked transfer encoding
//! - Messages with no body

use crate::buffer::{RingBuffer, ScratchStore};
use crate::codec::body::Decoded;
use crate::codec::body::chunked_decoder::ChunkedDecoder;
use crate::codec::body::length_decoder::LengthDecoder;
use crate::protocol::{HeaderMask, ParseError, Request};

/// A unified decoder for request payloads.
#[derive(Debug, Clone)]
pub struct PayloadDecoder {
    /// The specific decoding strategy to use
    kind: Kind,
}

#[derive(Debug, Clone)]
enum Kind {
    /// Decode payload with a fixed content length
    Length(LengthDecoder),

    /// Decode payload using chunked transfer encoding
    Chunked(ChunkedDecoder),

    /// Handle messages with no body
    NoBody,
}

impl PayloadDecoder {
    /// Creates a PayloadDecoder for messages with no body.
    pub fn empty() -> Self {
        Self { kind: Kind::NoBody }
    }

    /// Creates a PayloadDecoder for chunked transfer encoding, capturing
    /// trailers selected by `mask`.
    pub fn chunked(mask: HeaderMask) -> Self {
        Self { kind: Kind::Chunked(ChunkedDecoder::new(mask)) }
    }

    /// Creates a PayloadDecoder for a fixed-length payload.
    pub fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthDecoder::new(size)) }
    }

    /// Picks the framing announced by the request head. Chunked transfer
    /// encoding wins over `Content-Length`.
    pub fn for_request(request: &Request, mask: HeaderMask) -> Self {
        if request.is_chunked() {
            return Self::chunked(mask);
        }
        match request.content_length() {
            Some(length) if length > 0 => Self::fix_length(length),
            _ => Self::empty(),
        }
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, Kind::NoBody)
    }

    pub fn is_fix_length(&self) -> bool {
        matches!(self.kind, Kind::Length(_))
    }

    /// Whether the whole body has been consumed.
    pub fn is_eof(&self) -> bool {
        match &self.kind {
            Kind::Length(length_decoder) => length_decoder.remaining() == 0,
            Kind::Chunked(chunked_decoder) => chunked_decoder.is_eof(),
            Kind::NoBody => true,
        }
    }

    /// Delegates to the decoder of the selected framing.
    pub fn decode(
        &mut self,
        src: &mut RingBuffer,
        scratch: &mut ScratchStore,
        dst: &mut [u8],
    ) -> Result<Decoded, ParseError> {
        match &mut self.kind {
            Kind::Length(length_decoder) => length_decoder.decode(src, dst),
            Kind::Chunked(chunked_decoder) => chunked_decoder.decode(src, scratch, dst),
            Kind::NoBody => Ok(Decoded::Eof),
        }
    }
}

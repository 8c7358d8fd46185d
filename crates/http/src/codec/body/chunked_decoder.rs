//! Decoder for request bodies sent with chunked transfer encoding.
//!
//! See [RFC 7230 Section 4.1](https://tools.ietf.org/html/rfc7230#section-4.1).
//! Chunk data is copied straight from the input [`RingBuffer`] into the
//! caller's slice; the trailer section after the last chunk is handed to a
//! [`RequestParser`] in trailer mode, which records the trailers in the
//! [`ScratchStore`] like ordinary headers.

use crate::buffer::{RingBuffer, ScratchStore};
use crate::codec::body::Decoded;
use crate::codec::request_parser::{ParseStatus, RequestParser};
use crate::protocol::{HeaderMask, ParseError, Request};
use std::task::Poll;
use tracing::trace;
use ChunkedState::*;

/// A decoder for chunked transfer encoding.
///
/// - Each chunk starts with its size in hexadecimal, optionally followed by
///   `;extensions`, and a line end
/// - The chunk data follows, then a line end
/// - A zero-sized chunk is followed by the trailer section
///
/// Bare LF is accepted wherever CRLF is expected.
#[derive(Debug, Clone)]
pub struct ChunkedDecoder {
    state: ChunkedState,
    remaining_size: u64,
    size_digits: u32,
    mask: HeaderMask,
    trailers: Option<RequestParser>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Read the chunk size in hex
    Size,
    /// Whitespace after the size
    SizeLws,
    /// Skip chunk extensions
    Extension,
    /// Read LF after the size line's CR
    SizeLf,
    /// Copy chunk data
    Body,
    /// Read CR (or bare LF) after chunk data
    BodyCr,
    /// Read LF after chunk data
    BodyLf,
    /// Trailer section, driven by the trailer parser
    Trailer,
    /// Final state after the trailer section
    End,
}

impl ChunkedDecoder {
    /// Creates a decoder waiting for the size of the first chunk. Trailers are
    /// captured as selected by `mask`.
    pub fn new(mask: HeaderMask) -> Self {
        Self { state: Size, remaining_size: 0, size_digits: 0, mask, trailers: None }
    }

    pub fn is_eof(&self) -> bool {
        self.state == End
    }

    /// Decodes from `src` into `dst`.
    ///
    /// # Returns
    /// - `Ok(Decoded::Data(n))` when `n > 0` bytes of chunk data were copied
    /// - `Ok(Decoded::Eof)` once the last chunk and the trailers were read
    /// - `Ok(Decoded::NeedMore)` when `src` ran dry
    /// - `Err(ParseError)` if the encoding is invalid or the input ended early
    pub fn decode(
        &mut self,
        src: &mut RingBuffer,
        scratch: &mut ScratchStore,
        dst: &mut [u8],
    ) -> Result<Decoded, ParseError> {
        loop {
            match self.state {
                End => {
                    trace!("finished reading chunked data");
                    return Ok(Decoded::Eof);
                }
                Trailer => return self.read_trailers(src, scratch),
                _ => {}
            }

            if src.is_empty() {
                if src.is_eof() {
                    return Err(ParseError::UnexpectedEof);
                }
                return Ok(Decoded::NeedMore);
            }

            if self.state == Body {
                let read = Self::read_body(src, &mut self.remaining_size, dst);
                if self.remaining_size == 0 {
                    self.state = BodyCr;
                }
                trace!(len = read, "read chunked bytes");
                return Ok(Decoded::Data(read));
            }

            self.state = match self.state.step(src, &mut self.remaining_size, &mut self.size_digits) {
                Poll::Pending => return Ok(Decoded::NeedMore),
                Poll::Ready(Ok(new_state)) => new_state,
                Poll::Ready(Err(e)) => return Err(e),
            };
        }
    }

    fn read_body(src: &mut RingBuffer, remaining_size: &mut u64, dst: &mut [u8]) -> usize {
        let remaining = usize::try_from(*remaining_size).unwrap_or(usize::MAX);
        let len = remaining.min(dst.len());
        let read = src.read_bytes(&mut dst[..len]);
        *remaining_size -= read as u64;
        read
    }

    fn read_trailers(&mut self, src: &mut RingBuffer, scratch: &mut ScratchStore) -> Result<Decoded, ParseError> {
        let mask = self.mask;
        let parser = self.trailers.get_or_insert_with(|| RequestParser::trailers(mask));
        // trailers never touch the request; the dedicated headers are captured as text
        let mut unused = Request::default();
        match parser.parse(&mut unused, src, scratch)? {
            ParseStatus::Complete | ParseStatus::PeerClosed => {
                self.state = End;
                trace!("finished reading chunked data");
                Ok(Decoded::Eof)
            }
            ParseStatus::NeedMore => Ok(Decoded::NeedMore),
        }
    }
}

macro_rules! try_next_byte {
    ($src:ident) => {{
        match $src.pop() {
            Some(b) => b,
            None => return Poll::Pending,
        }
    }};
}

impl ChunkedState {
    /// Processes one byte of chunk framing.
    ///
    /// Chunk data and the trailer section are handled by the decoder itself.
    fn step(
        self,
        src: &mut RingBuffer,
        remaining_size: &mut u64,
        size_digits: &mut u32,
    ) -> Poll<Result<ChunkedState, ParseError>> {
        match self {
            Size => ChunkedState::read_size(src, remaining_size, size_digits),
            SizeLws => ChunkedState::read_size_lws(src, *remaining_size),
            Extension => ChunkedState::read_extension(src, *remaining_size),
            SizeLf => ChunkedState::read_size_lf(src, *remaining_size),
            BodyCr => ChunkedState::read_body_cr(src, size_digits),
            BodyLf => ChunkedState::read_body_lf(src, size_digits),
            Body | Trailer | End => Poll::Ready(Ok(self)),
        }
    }

    /// Accumulates hex digits of the chunk size.
    ///
    /// # State Transitions
    /// - On hex digit: stay in Size
    /// - On tab/space: SizeLws
    /// - On semicolon: Extension
    /// - On CR: SizeLf
    /// - On LF: end of the size line
    fn read_size(
        src: &mut RingBuffer,
        size_per_chunk: &mut u64,
        size_digits: &mut u32,
    ) -> Poll<Result<ChunkedState, ParseError>> {
        let digit = match try_next_byte!(src) {
            b @ b'0'..=b'9' => b - b'0',
            b @ b'a'..=b'f' => b + 10 - b'a',
            b @ b'A'..=b'F' => b + 10 - b'A',
            b'\t' | b' ' if *size_digits > 0 => return Poll::Ready(Ok(SizeLws)),
            b';' if *size_digits > 0 => return Poll::Ready(Ok(Extension)),
            b'\r' if *size_digits > 0 => return Poll::Ready(Ok(SizeLf)),
            b'\n' if *size_digits > 0 => return Poll::Ready(Ok(ChunkedState::after_size_line(*size_per_chunk))),
            _ => return Poll::Ready(Err(ParseError::bad_request("invalid chunk size line"))),
        };

        *size_per_chunk = match size_per_chunk.checked_mul(16).and_then(|n| n.checked_add(u64::from(digit))) {
            Some(size) => size,
            None => return Poll::Ready(Err(ParseError::bad_request("chunk size overflow"))),
        };
        *size_digits += 1;
        Poll::Ready(Ok(Size))
    }

    fn read_size_lws(src: &mut RingBuffer, size: u64) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            // no more digits after whitespace
            b'\t' | b' ' => Poll::Ready(Ok(SizeLws)),
            b';' => Poll::Ready(Ok(Extension)),
            b'\r' => Poll::Ready(Ok(SizeLf)),
            b'\n' => Poll::Ready(Ok(ChunkedState::after_size_line(size))),
            _ => Poll::Ready(Err(ParseError::bad_request("invalid chunk size linear white space"))),
        }
    }

    /// Extensions are skipped up to the end of the line.
    fn read_extension(src: &mut RingBuffer, size: u64) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\r' => Poll::Ready(Ok(SizeLf)),
            b'\n' => Poll::Ready(Ok(ChunkedState::after_size_line(size))),
            _ => Poll::Ready(Ok(Extension)),
        }
    }

    fn read_size_lf(src: &mut RingBuffer, size: u64) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\n' => Poll::Ready(Ok(ChunkedState::after_size_line(size))),
            _ => Poll::Ready(Err(ParseError::bad_request("invalid chunk size LF"))),
        }
    }

    fn after_size_line(size: u64) -> ChunkedState {
        if size == 0 { Trailer } else { Body }
    }

    /// Expects the line end that closes a chunk's data, then resets for the next size.
    fn read_body_cr(src: &mut RingBuffer, size_digits: &mut u32) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\r' => Poll::Ready(Ok(BodyLf)),
            b'\n' => {
                *size_digits = 0;
                Poll::Ready(Ok(Size))
            }
            _ => Poll::Ready(Err(ParseError::bad_request("invalid chunk body CR"))),
        }
    }

    fn read_body_lf(src: &mut RingBuffer, size_digits: &mut u32) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\n' => {
                *size_digits = 0;
                Poll::Ready(Ok(Size))
            }
            _ => Poll::Ready(Err(ParseError::bad_request("invalid chunk body LF"))),
        }
    }
}

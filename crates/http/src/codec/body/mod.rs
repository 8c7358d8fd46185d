//! Request body decoding and response body framing.
//!
//! # Components
//!
//! ## Decoders
//! - [`ChunkedDecoder`]: chunked transfer encoded payloads, including trailers
//! - [`LengthDecoder`]: fixed-length payloads
//! - [`PayloadDecoder`]: picks one of the above from the request head
//!
//! ## Encoder
//! - [`ChunkWriter`]: buffers response bytes and frames them as chunks when needed
//!
//! Decoders copy straight from the connection's input ring into the caller's
//! slice and report [`Decoded::NeedMore`] instead of blocking, leaving the
//! single read per exhaustion to the caller.

mod chunked_decoder;
mod chunked_encoder;
mod length_decoder;
mod payload_decoder;

pub use chunked_decoder::ChunkedDecoder;
pub use chunked_encoder::ChunkWriter;
pub use length_decoder::LengthDecoder;
pub use payload_decoder::PayloadDecoder;

/// Outcome of one decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// This many body bytes were copied into the destination
    Data(usize),
    /// The input ran dry before the body ended
    NeedMore,
    /// The body is complete
    Eof,
}

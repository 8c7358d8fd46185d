//! Byte storage owned by a connection.
//!
//! - [`RingBuffer`]: circular buffer used for socket input and response output
//! - [`ScratchStore`]: per-request text and metadata block filled by the parser

mod ring_buffer;
mod scratch;

pub use ring_buffer::{BufferFull, RingBuffer};
pub use scratch::{Headers, ScratchFull, ScratchStore, TextOffset};

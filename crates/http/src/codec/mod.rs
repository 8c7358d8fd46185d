//! Incremental request decoding and response encoding.
//!
//! - [`RequestParser`]: turns bytes from the input ring into a [`Request`](crate::protocol::Request)
//!   and captured headers, suspending whenever the input runs dry
//! - [`body`]: request payload decoders and the response [`ChunkWriter`]
//!
//! # Example
//!
//! ```
//! use minute_http::buffer::{RingBuffer, ScratchStore};
//! use minute_http::codec::{ParseStatus, RequestParser};
//! use minute_http::protocol::{HeaderMask, Request, RequestHeader};
//!
//! let mut input = RingBuffer::with_capacity(1024);
//! let mut scratch = ScratchStore::with_capacity(512);
//! let mut request = Request::default();
//! let mut parser = RequestParser::new(HeaderMask::ALL);
//!
//! input.write_bytes(b"GET /index.html HTTP/1.1\r\nHo").unwrap();
//! assert_eq!(parser.parse(&mut request, &mut input, &mut scratch), Ok(ParseStatus::NeedMore));
//!
//! input.write_bytes(b"st: example.com\r\n\r\n").unwrap();
//! assert_eq!(parser.parse(&mut request, &mut input, &mut scratch), Ok(ParseStatus::Complete));
//! assert_eq!(request.path(&scratch), b"/index.html");
//! assert_eq!(scratch.header(RequestHeader::Host), Some(&b"example.com"[..]));
//! ```

pub mod body;
mod request_parser;

pub use body::{ChunkWriter, Decoded, PayloadDecoder};
pub use request_parser::{ParseStatus, RequestParser};

//! An embeddable, incremental HTTP/1.x protocol engine.
//!
//! The crate turns a byte stream arriving in arbitrary fragments into requests
//! without ever buffering a whole request, and frames the responses an
//! application produces. It is meant to sit under a small server: the host owns
//! the sockets and tasks, the crate owns the protocol.
//!
//! # Features
//!
//! - HTTP/0.9, 1.0 and 1.1 requests, parsed one byte at a time from a fixed-size ring
//! - Percent-decoded path and query in a per-request scratch store
//! - Selective capture of request headers through a [`HeaderMask`](protocol::HeaderMask)
//! - Fixed-length, chunked (with trailers) and connection-close bodies
//! - Keep-alive, pipelining and `Expect: 100-continue`
//! - No response body for `HEAD`, 204, 205 and 304
//!
//! # Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use http::StatusCode;
//! use minute_http::buffer::ScratchStore;
//! use minute_http::connection::{BodyReader, BodyWriter, HeadWriter, HttpSession};
//! use minute_http::handler::{Application, ResponseError};
//! use minute_http::protocol::{Request, ResponseHeader};
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! struct Hello;
//!
//! #[async_trait]
//! impl Application for Hello {
//!     async fn head(&self, _: &Request, head: &mut HeadWriter<'_>, _: &ScratchStore) -> StatusCode {
//!         let _ = head.header(ResponseHeader::ContentType, "text/plain");
//!         StatusCode::OK
//!     }
//!
//!     async fn payload(&self, _: &Request, _: &mut HeadWriter<'_>, _: &mut BodyReader<'_>) -> StatusCode {
//!         StatusCode::OK
//!     }
//!
//!     async fn response(
//!         &self,
//!         _: &Request,
//!         body: &mut BodyWriter<'_>,
//!         _: &ScratchStore,
//!         _: StatusCode,
//!     ) -> Result<(), ResponseError> {
//!         body.write(b"Hello World!\r\n").await?;
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     let app = Arc::new(Hello);
//!     loop {
//!         let (stream, _) = listener.accept().await?;
//!         let app = Arc::clone(&app);
//!         tokio::spawn(async move {
//!             let (reader, writer) = stream.into_split();
//!             let _ = HttpSession::new(reader, writer).process(app).await;
//!         });
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`buffer`]: the ring buffer and the scratch store every session owns
//! - [`trie`]: compact token tables for methods, versions, header names and values
//! - [`codec`]: the request state machine and the body codecs
//! - [`connection`]: [`HttpSession`](connection::HttpSession) and the views it lends the application
//! - [`handler`]: the [`Application`](handler::Application) trait
//! - [`config`]: buffer sizes, header mask, server token and log sink
//! - [`protocol`]: request type, header codes, status text and errors
//!
//! # Limitations
//!
//! - HTTP/1.x only, no TLS
//! - The response header section must fit the output buffer
//! - Path, query and captured headers must fit the scratch store

pub mod buffer;
pub mod codec;
pub mod config;
pub mod connection;
pub mod handler;
pub mod protocol;
pub mod trie;

mod utils;
pub(crate) use utils::ensure;
